//! Error types for restock_tracker

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Unified error type for restock_tracker operations
#[derive(Debug, Error)]
pub enum RestockError {
    /// Store or product identifier is empty; nothing was recorded
    #[error("Invalid key: {field} must not be empty")]
    InvalidKey { field: &'static str },
    /// Observation is older than the latest recorded check for its key
    #[error("Out-of-order observation for {key}: {now} is before latest check at {latest}")]
    OutOfOrder {
        key: String,
        latest: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    /// A stored or supplied record holds a value outside its domain
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// The SQLite log could not be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Failed to parse JSON (API response or config file)
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration value is invalid
    #[error("Config error: {0}")]
    Config(String),
}

/// Short alias for `RestockError`
pub type Error = RestockError;

/// Result alias for restock_tracker operations
pub type Result<T> = std::result::Result<T, RestockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_names_the_field() {
        let err = RestockError::InvalidKey { field: "store_id" };
        assert_eq!(err.to_string(), "Invalid key: store_id must not be empty");
    }

    #[test]
    fn rusqlite_errors_become_storage_unavailable() {
        let err: RestockError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, RestockError::StorageUnavailable(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
