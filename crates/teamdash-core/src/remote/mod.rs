//! Remote relational backend
//!
//! The dashboard talks to a relational store with four tables (users,
//! servers, ips, domains). Servers, IPs and domains form a one-to-many
//! chain that is read back in a single nested read.
//!
//! ## Backends
//!
//! - `SqliteBackend`: local SQLite database with the same schema
//! - `RestBackend`: PostgREST-compatible HTTP API (e.g. a hosted Supabase
//!   project)
//!
//! Backends only move rows; validation and reconciliation with the
//! in-memory store happen in `Dashboard`.

mod error;
mod rest;
pub mod rows;
pub mod schema;
mod sqlite;

use async_trait::async_trait;

pub use error::{RemoteError, RemoteResult};
pub use rest::RestBackend;
pub use rows::{
    DomainRow, IpRow, NewDomainRow, NewIpRow, NewServerRow, NewUserRow, ServerPatchRow,
    ServerRow, UserPatchRow, UserRow,
};
pub use sqlite::SqliteBackend;

use crate::config::{BackendKind, Config};

/// Row-level access to the relational store
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read every user
    async fn fetch_users(&self) -> RemoteResult<Vec<UserRow>>;

    /// Read every server with nested IPs and their domains (one round trip)
    async fn fetch_servers_nested(&self) -> RemoteResult<Vec<ServerRow>>;

    /// Insert a server and return the stored row
    async fn insert_server(&self, row: &NewServerRow) -> RemoteResult<ServerRow>;

    /// Apply a sparse update to one server
    async fn update_server(&self, id: &str, patch: &ServerPatchRow) -> RemoteResult<()>;

    /// Delete a server; IPs and domains cascade
    async fn delete_server(&self, id: &str) -> RemoteResult<()>;

    /// Insert IPs in one call, returning stored rows in input order
    async fn insert_ips(&self, rows: &[NewIpRow]) -> RemoteResult<Vec<IpRow>>;

    /// Delete an IP; domains cascade
    async fn delete_ip(&self, id: &str) -> RemoteResult<()>;

    /// Delete every domain bound to an IP
    async fn delete_domains_for_ip(&self, ip_id: &str) -> RemoteResult<()>;

    /// Insert domains in one call, returning stored rows in input order
    async fn insert_domains(&self, rows: &[NewDomainRow]) -> RemoteResult<Vec<DomainRow>>;

    async fn insert_user(&self, row: &NewUserRow) -> RemoteResult<UserRow>;

    async fn update_user(&self, id: &str, row: &UserPatchRow) -> RemoteResult<()>;

    /// Clear `assigned_user_id` on every server referencing the user
    async fn unassign_user(&self, user_id: &str) -> RemoteResult<()>;

    async fn delete_user(&self, id: &str) -> RemoteResult<()>;
}

/// Build the backend selected by the configuration
pub fn backend_from_config(config: &Config) -> RemoteResult<Box<dyn Backend>> {
    match config.backend {
        BackendKind::Sqlite => Ok(Box::new(SqliteBackend::open(&config.sqlite_path())?)),
        BackendKind::Rest => Ok(Box::new(RestBackend::from_config(config)?)),
    }
}
