//! Domain command handlers

use anyhow::{Context, Result};

use teamdash_core::{Dashboard, DomainDraft};

use crate::output::Output;
use crate::resolve;

/// Replace the domain list of an IP
///
/// Each entry is `name` or `name:kind` (`found` or `production`). An empty
/// list removes every domain.
pub async fn set(
    dashboard: &mut Dashboard,
    server: &str,
    ip: &str,
    domains: Vec<String>,
    output: &Output,
) -> Result<()> {
    let server = resolve::server(dashboard.store(), server)?;
    let ip = resolve::ip(server, ip)?;
    let (server_id, ip_id) = (server.id.clone(), ip.id.clone());

    let drafts = parse_domains(&domains)?;
    let stored = dashboard.replace_domains(&server_id, &ip_id, drafts).await?;
    for domain in &stored {
        output.id(&domain.id);
    }
    Ok(())
}

fn parse_domains(args: &[String]) -> Result<Vec<DomainDraft>> {
    args.iter()
        .map(|arg| {
            arg.parse::<DomainDraft>()
                .with_context(|| format!("Invalid domain entry: '{}'", arg))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamdash_core::DomainKind;

    #[test]
    fn test_parse_domains() {
        let args = vec![
            "a.example.com".to_string(),
            "b.example.com:production".to_string(),
        ];
        let drafts = parse_domains(&args).unwrap();
        assert_eq!(drafts[0], DomainDraft::new("a.example.com", DomainKind::Found));
        assert_eq!(drafts[1].kind, DomainKind::Production);

        assert!(parse_domains(&["c.example.com:parked".to_string()]).is_err());
    }
}
