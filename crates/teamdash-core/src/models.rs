//! Data models for teamdash
//!
//! Defines the in-memory entities: User, Server, Ip and Domain.
//! A Server embeds its IPs and every IP embeds its Domains, mirroring
//! the single nested read the remote store answers with.
//!
//! The serde representation is camelCase (`mainIp`, `assignedUserId`,
//! `serverId`, `ipId`). Remote rows use snake_case and live in
//! `remote::rows`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main IP given to servers created without one
pub const DEFAULT_MAIN_IP: &str = "0.0.0.0";

/// Display name for servers without a (resolvable) owner
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Error returned when parsing an enum from user input fails
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind}: '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// A team member that servers can be assigned to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Operational status of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ServerStatus {
    Production,
    #[default]
    Test,
    Down,
    #[serde(rename = "Timed out")]
    TimedOut,
}

impl ServerStatus {
    /// Every status, in the order offered for inline status changes
    pub const ALL: [ServerStatus; 4] = [
        ServerStatus::Production,
        ServerStatus::Test,
        ServerStatus::Down,
        ServerStatus::TimedOut,
    ];

    /// Wire representation (also the display label)
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Production => "Production",
            ServerStatus::Test => "Test",
            ServerStatus::Down => "Down",
            ServerStatus::TimedOut => "Timed out",
        }
    }

    /// Down and timed-out servers count as issues on the dashboard
    pub fn is_issue(&self) -> bool {
        matches!(self, ServerStatus::Down | ServerStatus::TimedOut)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(ServerStatus::Production),
            "test" => Ok(ServerStatus::Test),
            "down" => Ok(ServerStatus::Down),
            "timed out" | "timed-out" | "timedout" => Ok(ServerStatus::TimedOut),
            _ => Err(ParseEnumError {
                kind: "server status",
                value: s.to_string(),
                expected: "Production, Test, Down, Timed out",
            }),
        }
    }
}

/// A tracked machine with its bound IPs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    pub main_ip: String,
    pub status: ServerStatus,
    /// Empty string means unassigned
    pub assigned_user_id: String,
    pub notes: String,
    pub ips: Vec<Ip>,
}

impl Server {
    /// Whether a user is assigned to this server
    pub fn is_assigned(&self) -> bool {
        !self.assigned_user_id.is_empty()
    }

    pub fn ip_count(&self) -> usize {
        self.ips.len()
    }

    /// Number of domains summed across all IPs
    pub fn domain_count(&self) -> usize {
        self.ips.iter().map(|ip| ip.domains.len()).sum()
    }

    /// Check whether an address is already bound to this server
    pub fn has_address(&self, address: &str) -> bool {
        self.ips.iter().any(|ip| ip.address == address)
    }

    /// Find an IP by ID
    pub fn ip(&self, ip_id: &str) -> Option<&Ip> {
        self.ips.iter().find(|ip| ip.id == ip_id)
    }
}

/// An IPv4 address bound to a server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ip {
    pub id: String,
    pub address: String,
    pub server_id: String,
    pub domains: Vec<Domain>,
}

/// How a domain was attached to an IP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    /// Discovered pointing at the IP
    Found,
    /// Actively served from the IP
    Production,
}

impl DomainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Found => "found",
            DomainKind::Production => "production",
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "found" => Ok(DomainKind::Found),
            "production" => Ok(DomainKind::Production),
            _ => Err(ParseEnumError {
                kind: "domain type",
                value: s.to_string(),
                expected: "found, production",
            }),
        }
    }
}

/// A DNS name bound to an IP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    pub ip_id: String,
}

/// A domain entry supplied by the caller when replacing an IP's domain list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDraft {
    pub domain: String,
    pub kind: DomainKind,
}

impl DomainDraft {
    pub fn new(domain: impl Into<String>, kind: DomainKind) -> Self {
        Self {
            domain: domain.into(),
            kind,
        }
    }
}

impl FromStr for DomainDraft {
    type Err = ParseEnumError;

    /// Parse `name` or `name:kind` (kind defaults to `found`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((domain, kind)) => Ok(Self::new(domain.trim(), kind.parse()?)),
            None => Ok(Self::new(s.trim(), DomainKind::Found)),
        }
    }
}

/// Fields for creating a server
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewServer {
    pub name: String,
    /// Blank means `DEFAULT_MAIN_IP`
    pub main_ip: String,
    pub status: ServerStatus,
    /// Blank means unassigned
    pub assigned_user_id: String,
    pub notes: String,
}

impl NewServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn main_ip(mut self, main_ip: impl Into<String>) -> Self {
        self.main_ip = main_ip.into();
        self
    }

    pub fn status(mut self, status: ServerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn assigned_to(mut self, user_id: impl Into<String>) -> Self {
        self.assigned_user_id = user_id.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Sparse update for a server
///
/// `None` leaves a field untouched. `Some("")` is an explicit clear and is
/// only meaningful for `notes` and `assigned_user_id` (unassign).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerPatch {
    pub name: Option<String>,
    pub main_ip: Option<String>,
    pub status: Option<ServerStatus>,
    pub assigned_user_id: Option<String>,
    pub notes: Option<String>,
}

impl ServerPatch {
    /// A patch that only changes the status
    pub fn status(status: ServerStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.main_ip.is_none()
            && self.status.is_none()
            && self.assigned_user_id.is_none()
            && self.notes.is_none()
    }

    /// Apply the set fields to a server in place
    pub fn apply_to(&self, server: &mut Server) {
        if let Some(ref name) = self.name {
            server.name = name.clone();
        }
        if let Some(ref main_ip) = self.main_ip {
            server.main_ip = main_ip.clone();
        }
        if let Some(status) = self.status {
            server.status = status;
        }
        if let Some(ref user_id) = self.assigned_user_id {
            server.assigned_user_id = user_id.clone();
        }
        if let Some(ref notes) = self.notes {
            server.notes = notes.clone();
        }
    }
}
