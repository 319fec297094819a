//! Remote row shapes and field translation
//!
//! Rows mirror the relational tables (snake_case columns). Reads are
//! translated into the in-memory model with `From` impls; writes are built
//! from the model's input types.
//!
//! | Model field               | Column                         |
//! |---------------------------|--------------------------------|
//! | `Server::main_ip`         | `servers.main_ip`              |
//! | `Server::assigned_user_id`| `servers.assigned_user_id` (nullable, `''` ⇔ NULL) |
//! | `Ip::server_id`           | `ips.server_id`                |
//! | `Domain::ip_id`           | `domains.ip_id`                |
//! | `Domain::kind`            | `domains.type`                 |

use serde::{Deserialize, Serialize};

use crate::models::{
    Domain, DomainDraft, DomainKind, Ip, NewServer, Server, ServerPatch, ServerStatus, User,
};

/// Table names
pub const USERS_TABLE: &str = "users";
pub const SERVERS_TABLE: &str = "servers";
pub const IPS_TABLE: &str = "ips";
pub const DOMAINS_TABLE: &str = "domains";

// ==================== Read rows ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub name: String,
}

/// A server row with its nested IPs (and their domains)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub main_ip: Option<String>,
    pub status: ServerStatus,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ips: Option<Vec<IpRow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpRow {
    pub id: String,
    pub address: String,
    pub server_id: String,
    #[serde(default)]
    pub domains: Option<Vec<DomainRow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainRow {
    pub id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    pub ip_id: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<ServerRow> for Server {
    fn from(row: ServerRow) -> Self {
        Server {
            id: row.id,
            name: row.name,
            main_ip: row.main_ip.unwrap_or_default(),
            status: row.status,
            assigned_user_id: row.assigned_user_id.unwrap_or_default(),
            notes: row.notes.unwrap_or_default(),
            ips: row
                .ips
                .unwrap_or_default()
                .into_iter()
                .map(Ip::from)
                .collect(),
        }
    }
}

impl From<IpRow> for Ip {
    fn from(row: IpRow) -> Self {
        Ip {
            id: row.id,
            address: row.address,
            server_id: row.server_id,
            domains: row
                .domains
                .unwrap_or_default()
                .into_iter()
                .map(Domain::from)
                .collect(),
        }
    }
}

impl From<DomainRow> for Domain {
    fn from(row: DomainRow) -> Self {
        Domain {
            id: row.id,
            domain: row.domain,
            kind: row.kind,
            ip_id: row.ip_id,
        }
    }
}

// ==================== Write rows ====================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewServerRow {
    pub name: String,
    pub main_ip: String,
    pub status: ServerStatus,
    pub assigned_user_id: Option<String>,
    pub notes: String,
}

impl From<&NewServer> for NewServerRow {
    fn from(server: &NewServer) -> Self {
        NewServerRow {
            name: server.name.clone(),
            main_ip: server.main_ip.clone(),
            status: server.status,
            assigned_user_id: non_empty(&server.assigned_user_id),
            notes: server.notes.clone(),
        }
    }
}

/// Sparse server update; unset fields are left out of the payload
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct ServerPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
    /// `Some(None)` writes NULL (unassign)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&ServerPatch> for ServerPatchRow {
    fn from(patch: &ServerPatch) -> Self {
        ServerPatchRow {
            name: patch.name.clone(),
            main_ip: patch.main_ip.clone(),
            status: patch.status,
            assigned_user_id: patch.assigned_user_id.as_deref().map(non_empty),
            notes: patch.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewIpRow {
    pub address: String,
    pub server_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewDomainRow {
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    pub ip_id: String,
}

impl NewDomainRow {
    pub fn from_draft(draft: &DomainDraft, ip_id: &str) -> Self {
        NewDomainRow {
            domain: draft.domain.clone(),
            kind: draft.kind,
            ip_id: ip_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewUserRow {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserPatchRow {
    pub name: String,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_read_translation() {
        let payload = json!([{
            "id": "s1",
            "name": "web-1",
            "main_ip": "192.168.1.10",
            "status": "Timed out",
            "assigned_user_id": null,
            "notes": null,
            "ips": [{
                "id": "ip1",
                "address": "10.0.0.1",
                "server_id": "s1",
                "domains": [
                    {"id": "d1", "domain": "example.com", "type": "production", "ip_id": "ip1"}
                ]
            }]
        }]);

        let rows: Vec<ServerRow> = serde_json::from_value(payload).unwrap();
        let servers: Vec<Server> = rows.into_iter().map(Server::from).collect();

        let server = &servers[0];
        assert_eq!(server.main_ip, "192.168.1.10");
        assert_eq!(server.status, ServerStatus::TimedOut);
        assert_eq!(server.assigned_user_id, "");
        assert_eq!(server.notes, "");
        assert_eq!(server.ips[0].server_id, "s1");
        assert_eq!(server.ips[0].domains[0].ip_id, "ip1");
        assert_eq!(server.ips[0].domains[0].kind, DomainKind::Production);
    }

    #[test]
    fn test_missing_nested_collections_default_empty() {
        let payload = json!({
            "id": "s2",
            "name": "db-1",
            "main_ip": "10.0.0.9",
            "status": "Test",
            "assigned_user_id": "u1",
            "ips": null
        });

        let server: Server = serde_json::from_value::<ServerRow>(payload).unwrap().into();
        assert!(server.ips.is_empty());
        assert_eq!(server.assigned_user_id, "u1");
    }

    #[test]
    fn test_new_server_row_nulls_unassigned() {
        let row = NewServerRow::from(&NewServer::new("web-2").main_ip("10.0.0.2"));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["assigned_user_id"], serde_json::Value::Null);
        assert_eq!(json["main_ip"], "10.0.0.2");
        assert_eq!(json["status"], "Test");
    }

    #[test]
    fn test_patch_row_is_sparse() {
        let row = ServerPatchRow::from(&ServerPatch::status(ServerStatus::Down));
        assert_eq!(serde_json::to_value(&row).unwrap(), json!({"status": "Down"}));
    }

    #[test]
    fn test_patch_row_unassign_writes_null() {
        let patch = ServerPatch {
            assigned_user_id: Some(String::new()),
            notes: Some(String::new()),
            ..ServerPatch::default()
        };
        let json = serde_json::to_value(ServerPatchRow::from(&patch)).unwrap();
        assert_eq!(json, json!({"assigned_user_id": null, "notes": ""}));
    }

    #[test]
    fn test_domain_row_uses_type_column() {
        let row = NewDomainRow::from_draft(&DomainDraft::new("a.example.com", DomainKind::Found), "ip1");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, json!({"domain": "a.example.com", "type": "found", "ip_id": "ip1"}));
    }
}
