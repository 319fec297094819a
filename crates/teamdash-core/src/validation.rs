//! Input validation for IP batches and domain lists
//!
//! Checks run before any remote call; a failing batch is rejected whole.

use crate::error::{DashboardError, DashboardResult};
use crate::models::{DomainDraft, Server};

/// Check for a dotted-quad IPv4 address
///
/// Four octets of one to three digits, each at most 255. Leading zeros
/// are accepted and surrounding whitespace is ignored.
pub fn is_valid_ipv4(candidate: &str) -> bool {
    let candidate = candidate.trim();
    let mut octets = 0;

    for part in candidate.split('.') {
        octets += 1;
        if octets > 4 || part.is_empty() || part.len() > 3 {
            return false;
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match part.parse::<u16>() {
            Ok(value) if value <= 255 => {}
            _ => return false,
        }
    }

    octets == 4
}

/// Validate a batch of addresses for a server
///
/// Returns the trimmed addresses, or rejects the whole batch listing
/// every invalid address (checked first) or every duplicate. An address
/// repeated inside the batch counts as a duplicate.
pub fn validate_new_ips(server: &Server, candidates: &[String]) -> DashboardResult<Vec<String>> {
    let addresses: Vec<String> = candidates.iter().map(|c| c.trim().to_string()).collect();

    if addresses.is_empty() {
        return Err(DashboardError::MissingField {
            field: "IP address",
        });
    }

    let invalid: Vec<String> = addresses
        .iter()
        .filter(|a| !is_valid_ipv4(a))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(DashboardError::InvalidIps { addresses: invalid });
    }

    let mut duplicates: Vec<String> = Vec::new();
    for (i, address) in addresses.iter().enumerate() {
        let repeated = addresses[..i].contains(address);
        if (server.has_address(address) || repeated) && !duplicates.contains(address) {
            duplicates.push(address.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(DashboardError::DuplicateIps {
            addresses: duplicates,
        });
    }

    Ok(addresses)
}

/// Validate a replacement domain list, trimming names
pub fn validate_domains(drafts: &[DomainDraft]) -> DashboardResult<Vec<DomainDraft>> {
    drafts
        .iter()
        .map(|draft| {
            let name = draft.domain.trim();
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(DashboardError::InvalidDomain(draft.domain.clone()));
            }
            Ok(DomainDraft::new(name, draft.kind))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DomainKind, Ip, ServerStatus};

    fn server_with(addresses: &[&str]) -> Server {
        Server {
            id: "s1".to_string(),
            name: "web".to_string(),
            main_ip: "0.0.0.0".to_string(),
            status: ServerStatus::Test,
            assigned_user_id: String::new(),
            notes: String::new(),
            ips: addresses
                .iter()
                .enumerate()
                .map(|(i, a)| Ip {
                    id: format!("ip{}", i),
                    address: a.to_string(),
                    server_id: "s1".to_string(),
                    domains: Vec::new(),
                })
                .collect(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_ipv4() {
        for ip in ["10.0.0.1", "255.255.255.255", "0.0.0.0", " 192.168.1.1 ", "010.001.1.1"] {
            assert!(is_valid_ipv4(ip), "{} should be valid", ip);
        }
    }

    #[test]
    fn test_invalid_ipv4() {
        for ip in [
            "bad-ip",
            "256.0.0.1",
            "10.0.0",
            "10.0.0.1.5",
            "10..0.1",
            "1000.0.0.1",
            "10.0.0.-1",
            "a.b.c.d",
            "",
            "10.0.0.1/24",
        ] {
            assert!(!is_valid_ipv4(ip), "{} should be invalid", ip);
        }
    }

    #[test]
    fn test_batch_with_invalid_is_rejected() {
        let server = server_with(&[]);
        let err = validate_new_ips(&server, &strings(&["10.0.0.1", "bad-ip"])).unwrap_err();
        match err {
            DashboardError::InvalidIps { addresses } => assert_eq!(addresses, vec!["bad-ip"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_batch_with_existing_is_rejected() {
        let server = server_with(&["10.0.0.1"]);
        let err = validate_new_ips(&server, &strings(&["10.0.0.2", " 10.0.0.1"])).unwrap_err();
        match err {
            DashboardError::DuplicateIps { addresses } => assert_eq!(addresses, vec!["10.0.0.1"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_batch_repeating_an_address_is_rejected() {
        let server = server_with(&[]);
        let err = validate_new_ips(&server, &strings(&["10.0.0.3", "10.0.0.3", "10.0.0.3"])).unwrap_err();
        match err {
            DashboardError::DuplicateIps { addresses } => assert_eq!(addresses, vec!["10.0.0.3"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_batch_is_trimmed() {
        let server = server_with(&["10.0.0.1"]);
        let addresses = validate_new_ips(&server, &strings(&[" 10.0.0.2 ", "10.0.0.3"])).unwrap();
        assert_eq!(addresses, vec!["10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let server = server_with(&[]);
        assert!(matches!(
            validate_new_ips(&server, &[]),
            Err(DashboardError::MissingField { .. })
        ));
    }

    #[test]
    fn test_validate_domains() {
        let drafts = vec![
            DomainDraft::new(" a.example.com ", DomainKind::Found),
            DomainDraft::new("b.example.com", DomainKind::Production),
        ];
        let cleaned = validate_domains(&drafts).unwrap();
        assert_eq!(cleaned[0].domain, "a.example.com");
        assert_eq!(cleaned[1].kind, DomainKind::Production);

        let blank = vec![DomainDraft::new("  ", DomainKind::Found)];
        assert!(matches!(
            validate_domains(&blank),
            Err(DashboardError::InvalidDomain(_))
        ));
    }
}
