//! Local SQLite backend
//!
//! Stores the four dashboard tables in a SQLite file. Row order follows
//! insertion order (`rowid`), matching the order a hosted store returns
//! rows without an explicit `order` clause.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;
use uuid::Uuid;

use super::error::{RemoteError, RemoteResult};
use super::rows::{
    DomainRow, IpRow, NewDomainRow, NewIpRow, NewServerRow, NewUserRow, ServerPatchRow,
    ServerRow, UserPatchRow, UserRow,
};
use super::schema::{init_schema, needs_init};
use super::Backend;
use crate::models::{DomainKind, ServerStatus};

/// SQLite implementation of `Backend`
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> RemoteResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!("Opening SQLite backend at {:?}", path);
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> RemoteResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> RemoteResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RemoteError::Lock)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn parse_status(value: String) -> RemoteResult<ServerStatus> {
    value.parse().map_err(|_| RemoteError::InvalidValue {
        column: "servers.status",
        value,
    })
}

fn parse_kind(value: String) -> RemoteResult<DomainKind> {
    value.parse().map_err(|_| RemoteError::InvalidValue {
        column: "domains.type",
        value,
    })
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn fetch_users(&self) -> RemoteResult<Vec<UserRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UserRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn fetch_servers_nested(&self) -> RemoteResult<Vec<ServerRow>> {
        let conn = self.lock()?;

        // Domains grouped by IP
        let mut domains_by_ip: HashMap<String, Vec<DomainRow>> = HashMap::new();
        let mut stmt = conn.prepare("SELECT id, domain, type, ip_id FROM domains ORDER BY rowid")?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (id, domain, kind, ip_id) in raw {
            domains_by_ip.entry(ip_id.clone()).or_default().push(DomainRow {
                id,
                domain,
                kind: parse_kind(kind)?,
                ip_id,
            });
        }

        // IPs grouped by server
        let mut ips_by_server: HashMap<String, Vec<IpRow>> = HashMap::new();
        let mut stmt = conn.prepare("SELECT id, address, server_id FROM ips ORDER BY rowid")?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (id, address, server_id) in raw {
            let domains = domains_by_ip.remove(&id).unwrap_or_default();
            ips_by_server.entry(server_id.clone()).or_default().push(IpRow {
                id,
                address,
                server_id,
                domains: Some(domains),
            });
        }

        let mut stmt = conn.prepare(
            "SELECT id, name, main_ip, status, assigned_user_id, notes FROM servers ORDER BY rowid",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut servers = Vec::with_capacity(raw.len());
        for (id, name, main_ip, status, assigned_user_id, notes) in raw {
            let ips = ips_by_server.remove(&id).unwrap_or_default();
            servers.push(ServerRow {
                id,
                name,
                main_ip,
                status: parse_status(status)?,
                assigned_user_id,
                notes,
                ips: Some(ips),
            });
        }

        Ok(servers)
    }

    async fn insert_server(&self, row: &NewServerRow) -> RemoteResult<ServerRow> {
        let conn = self.lock()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO servers (id, name, main_ip, status, assigned_user_id, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                row.name,
                row.main_ip,
                row.status.as_str(),
                row.assigned_user_id,
                row.notes
            ],
        )?;

        Ok(ServerRow {
            id,
            name: row.name.clone(),
            main_ip: Some(row.main_ip.clone()),
            status: row.status,
            assigned_user_id: row.assigned_user_id.clone(),
            notes: Some(row.notes.clone()),
            ips: Some(Vec::new()),
        })
    }

    async fn update_server(&self, id: &str, patch: &ServerPatchRow) -> RemoteResult<()> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(ref name) = patch.name {
            assignments.push("name = ?");
            values.push(Value::Text(name.clone()));
        }
        if let Some(ref main_ip) = patch.main_ip {
            assignments.push("main_ip = ?");
            values.push(Value::Text(main_ip.clone()));
        }
        if let Some(status) = patch.status {
            assignments.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(ref user_id) = patch.assigned_user_id {
            assignments.push("assigned_user_id = ?");
            values.push(match user_id {
                Some(user_id) => Value::Text(user_id.clone()),
                None => Value::Null,
            });
        }
        if let Some(ref notes) = patch.notes {
            assignments.push("notes = ?");
            values.push(Value::Text(notes.clone()));
        }

        if assignments.is_empty() {
            return Ok(());
        }

        values.push(Value::Text(id.to_string()));
        let sql = format!("UPDATE servers SET {} WHERE id = ?", assignments.join(", "));

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    async fn delete_server(&self, id: &str) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM servers WHERE id = ?1", [id])?;
        Ok(())
    }

    async fn insert_ips(&self, rows: &[NewIpRow]) -> RemoteResult<Vec<IpRow>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let id = new_id();
            tx.execute(
                "INSERT INTO ips (id, address, server_id) VALUES (?1, ?2, ?3)",
                params![id, row.address, row.server_id],
            )?;
            inserted.push(IpRow {
                id,
                address: row.address.clone(),
                server_id: row.server_id.clone(),
                domains: Some(Vec::new()),
            });
        }

        tx.commit()?;
        Ok(inserted)
    }

    async fn delete_ip(&self, id: &str) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM ips WHERE id = ?1", [id])?;
        Ok(())
    }

    async fn delete_domains_for_ip(&self, ip_id: &str) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM domains WHERE ip_id = ?1", [ip_id])?;
        Ok(())
    }

    async fn insert_domains(&self, rows: &[NewDomainRow]) -> RemoteResult<Vec<DomainRow>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let id = new_id();
            tx.execute(
                "INSERT INTO domains (id, domain, type, ip_id) VALUES (?1, ?2, ?3, ?4)",
                params![id, row.domain, row.kind.as_str(), row.ip_id],
            )?;
            inserted.push(DomainRow {
                id,
                domain: row.domain.clone(),
                kind: row.kind,
                ip_id: row.ip_id.clone(),
            });
        }

        tx.commit()?;
        Ok(inserted)
    }

    async fn insert_user(&self, row: &NewUserRow) -> RemoteResult<UserRow> {
        let conn = self.lock()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO users (id, name) VALUES (?1, ?2)",
            params![id, row.name],
        )?;
        Ok(UserRow {
            id,
            name: row.name.clone(),
        })
    }

    async fn update_user(&self, id: &str, row: &UserPatchRow) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute("UPDATE users SET name = ?1 WHERE id = ?2", params![row.name, id])?;
        Ok(())
    }

    async fn unassign_user(&self, user_id: &str) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE servers SET assigned_user_id = NULL WHERE assigned_user_id = ?1",
            [user_id],
        )?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(())
    }
}
