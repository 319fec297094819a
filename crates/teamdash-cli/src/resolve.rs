//! Resolve command-line references to entities
//!
//! A reference can be a full ID, an ID prefix, or a name (IP address for
//! IPs). Exact ID wins, then exact name (case-insensitive), then prefix.

use anyhow::{bail, Result};

use teamdash_core::{EntityStore, Ip, Server, User};

use crate::output::short_id;

/// Find a server by ID, ID prefix or name
pub fn server<'a>(store: &'a EntityStore, query: &str) -> Result<&'a Server> {
    resolve(store.servers(), query, "server", |s| s.id.as_str(), |s| s.name.as_str())
}

/// Find a user by ID, ID prefix or name
pub fn user<'a>(store: &'a EntityStore, query: &str) -> Result<&'a User> {
    resolve(store.users(), query, "user", |u| u.id.as_str(), |u| u.name.as_str())
}

/// Find an IP on a server by address, ID or ID prefix
pub fn ip<'a>(server: &'a Server, query: &str) -> Result<&'a Ip> {
    resolve(&server.ips, query, "IP", |ip| ip.id.as_str(), |ip| ip.address.as_str())
}

fn resolve<'a, T>(
    items: &'a [T],
    query: &str,
    kind: &str,
    id: impl Fn(&T) -> &str,
    name: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    let query = query.trim();
    if query.is_empty() {
        bail!("No {} given", kind);
    }

    if let Some(item) = items.iter().find(|item| id(item) == query) {
        return Ok(item);
    }

    let by_name: Vec<&T> = items
        .iter()
        .filter(|item| name(item).eq_ignore_ascii_case(query))
        .collect();
    let matches = if by_name.is_empty() {
        items
            .iter()
            .filter(|item| id(item).starts_with(query))
            .collect()
    } else {
        by_name
    };

    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, query),
        1 => Ok(matches[0]),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, query);
            for item in &matches {
                eprintln!("  {} - {}", short_id(id(item)), name(item));
            }
            bail!("Ambiguous {}. Please use the ID.", kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamdash_core::ServerStatus;

    fn make_server(id: &str, name: &str) -> Server {
        Server {
            id: id.to_string(),
            name: name.to_string(),
            main_ip: "0.0.0.0".to_string(),
            status: ServerStatus::Test,
            assigned_user_id: String::new(),
            notes: String::new(),
            ips: Vec::new(),
        }
    }

    fn store() -> EntityStore {
        EntityStore::with_data(
            vec![User::new("aa11", "Alice"), User::new("ab22", "Bob")],
            vec![
                make_server("1234-aaaa", "web"),
                make_server("1299-bbbb", "db"),
                make_server("5678-cccc", "WEB-2"),
            ],
        )
    }

    #[test]
    fn test_exact_id() {
        let store = store();
        assert_eq!(server(&store, "1234-aaaa").unwrap().name, "web");
    }

    #[test]
    fn test_name_case_insensitive() {
        let store = store();
        assert_eq!(server(&store, "web-2").unwrap().id, "5678-cccc");
        assert_eq!(user(&store, "alice").unwrap().id, "aa11");
    }

    #[test]
    fn test_unique_prefix() {
        let store = store();
        assert_eq!(server(&store, "5678").unwrap().name, "WEB-2");
        assert_eq!(user(&store, "ab").unwrap().name, "Bob");
    }

    #[test]
    fn test_ambiguous_prefix() {
        let store = store();
        assert!(server(&store, "12").is_err());
        assert!(user(&store, "a").is_err());
    }

    #[test]
    fn test_no_match() {
        let store = store();
        assert!(server(&store, "nope").is_err());
        assert!(server(&store, " ").is_err());
    }

    #[test]
    fn test_ip_by_address() {
        let mut srv = make_server("s1", "web");
        srv.ips.push(Ip {
            id: "ip-1".to_string(),
            address: "10.0.0.1".to_string(),
            server_id: "s1".to_string(),
            domains: Vec::new(),
        });
        assert_eq!(ip(&srv, "10.0.0.1").unwrap().id, "ip-1");
        assert_eq!(ip(&srv, "ip-").unwrap().address, "10.0.0.1");
    }
}
