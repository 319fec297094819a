//! IP command handlers

use anyhow::Result;

use teamdash_core::Dashboard;

use crate::output::Output;
use crate::prompt::confirm;
use crate::resolve;

/// Add IPs to a server
///
/// Addresses may be given as separate arguments or comma-separated.
pub async fn add(
    dashboard: &mut Dashboard,
    server: &str,
    addresses: Vec<String>,
    output: &Output,
) -> Result<()> {
    let server_id = resolve::server(dashboard.store(), server)?.id.clone();
    let addresses = split_addresses(&addresses);

    let ips = dashboard.add_ips(&server_id, &addresses).await?;
    for ip in &ips {
        output.id(&ip.id);
    }
    Ok(())
}

/// Remove an IP and its domains
pub async fn delete(dashboard: &mut Dashboard, server: &str, ip: &str, output: &Output) -> Result<()> {
    let server = resolve::server(dashboard.store(), server)?;
    let ip = resolve::ip(server, ip)?;
    let (server_id, ip_id) = (server.id.clone(), ip.id.clone());

    if output.should_prompt() {
        println!(
            "Delete IP: {} from {} ({} domain(s))",
            ip.address,
            server.name,
            ip.domains.len()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    dashboard.delete_ip(&server_id, &ip_id).await?;
    Ok(())
}

fn split_addresses(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.split(','))
        .map(|address| address.trim())
        .filter(|address| !address.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_addresses() {
        let args = vec!["10.0.0.1,10.0.0.2".to_string(), " 10.0.0.3 ".to_string(), ",".to_string()];
        assert_eq!(
            split_addresses(&args),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }
}
