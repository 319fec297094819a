//! Remote backend error handling

use thiserror::Error;

/// Errors raised while talking to the relational backend
#[derive(Error, Debug)]
pub enum RemoteError {
    /// SQLite error from the local backend
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A stored value does not fit the data model
    #[error("Invalid {column} value in backend: '{value}'")]
    InvalidValue { column: &'static str, value: String },

    /// The response was well-formed but not what the call requires
    #[error("Unexpected backend response: {0}")]
    UnexpectedResponse(String),

    /// The backend cannot be used with the current configuration
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    /// Failed to prepare the local database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection lock was poisoned by a panic
    #[error("Backend connection lock poisoned")]
    Lock,
}

/// Result type for backend operations
pub type RemoteResult<T> = Result<T, RemoteError>;
