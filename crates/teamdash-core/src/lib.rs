//! teamdash Core Library
//!
//! This crate provides the core functionality for teamdash, a dashboard
//! for tracking a team's servers, the IPs bound to them and the domains
//! bound to those IPs.
//!
//! # Architecture
//!
//! - **Remote backend**: Source of truth (SQLite file or a PostgREST API)
//! - **Entity store**: In-memory copy of the last state the backend confirmed
//!
//! All queries are served from the in-memory store. Writes go to the
//! backend first and reach the store only once confirmed.
//!
//! # Quick Start
//!
//! ```text
//! let mut dashboard = Dashboard::open(&Config::load()?)?;
//! dashboard.refresh().await?;
//!
//! // Add a server and bind an IP
//! let server = dashboard.add_server(NewServer::new("web-1")).await?;
//! dashboard.add_ips(&server.id, &["10.0.0.1".to_string()]).await?;
//!
//! // Query servers
//! let view = dashboard.server_view();
//! ```
//!
//! # Modules
//!
//! - `dashboard`: Store and backend kept in step (main entry point)
//! - `store`: In-memory entity store
//! - `models`: Users, servers, IPs and domains
//! - `query`: Search, sort and pagination
//! - `remote`: Backend trait with SQLite and REST implementations
//! - `validation`: IPv4 and domain input checks
//! - `notice`: Success/error messages for front ends
//! - `config`: Application configuration

pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod notice;
pub mod query;
pub mod remote;
pub mod store;
pub mod validation;

pub use config::{BackendKind, Config};
pub use dashboard::Dashboard;
pub use error::{DashboardError, DashboardResult};
pub use models::{
    Domain, DomainDraft, DomainKind, Ip, NewServer, Server, ServerPatch, ServerStatus, User,
};
pub use notice::{Notice, NoticeLevel};
pub use query::{DashboardView, ServerStats, SortConfig, SortDirection, SortKey, UserStats, UserView, ViewState};
pub use remote::{Backend, RemoteError, RestBackend, SqliteBackend};
pub use store::EntityStore;
