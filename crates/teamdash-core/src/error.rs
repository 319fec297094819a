//! Dashboard error handling
//!
//! Validation errors are raised before any remote call and never change
//! state. Remote errors wrap `RemoteError` and leave the entity store at
//! its last confirmed value.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors returned by dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required field was blank
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// One or more addresses are not dotted-quad IPv4
    #[error("Invalid IPs: {}", .addresses.join(", "))]
    InvalidIps { addresses: Vec<String> },

    /// One or more addresses already exist on the server
    #[error("IPs already exist: {}", .addresses.join(", "))]
    DuplicateIps { addresses: Vec<String> },

    /// A domain entry has no name
    #[error("Invalid domain name: '{0}'")]
    InvalidDomain(String),

    /// Assignment to a user that is not in the roster
    #[error("Unknown user: '{0}'")]
    UnknownUser(String),

    /// The referenced entity is not in the store
    #[error("{kind} not found: '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// The backend call failed
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl DashboardError {
    /// Whether the error was caught before reaching the backend
    pub fn is_validation(&self) -> bool {
        !matches!(self, DashboardError::Remote(_))
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        DashboardError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_ips_lists_addresses() {
        let err = DashboardError::InvalidIps {
            addresses: vec!["bad-ip".to_string(), "300.1.1.1".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid IPs: bad-ip, 300.1.1.1");
        assert!(err.is_validation());
    }

    #[test]
    fn test_remote_is_not_validation() {
        let err = DashboardError::from(RemoteError::Lock);
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("Remote error"));
    }

    #[test]
    fn test_not_found_display() {
        let err = DashboardError::not_found("Server", "s-1");
        assert_eq!(err.to_string(), "Server not found: 's-1'");
    }
}
