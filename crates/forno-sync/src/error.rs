//! # Sync Error Types
//!
//! Error types for checkout submission and the offline queue.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Remote        │  │     Local               │ │
//! │  │                 │  │  (RemoteError)  │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Database (DbError)     │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Core (CoreError)       │ │
//! │  │  ConfigLoad...  │  │  Rejected       │  │  NotRequeueable         │ │
//! │  └─────────────────┘  │  Server         │  └─────────────────────────┘ │
//! │                       │  InvalidResponse│                              │
//! │                       └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `RemoteError` is kept separate from `SyncError` because the queue
//! records it on the pending order, while a `SyncError::Database` aborts
//! the drain.

use forno_core::CoreError;
use forno_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type alias for calls across the remote boundary.
pub type RemoteResult<T> = Result<T, RemoteError>;

// =============================================================================
// Remote Errors
// =============================================================================

/// Failure of a single call to the hosted backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never got an answer (DNS, refused, reset, TLS).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// No answer within the configured limit, in milliseconds.
    #[error("Remote call timed out after {0} ms")]
    Timeout(u64),

    /// The backend refused the request (4xx).
    #[error("Rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend failed (5xx).
    #[error("Backend error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The answer could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            RemoteError::Server { status, message }
        } else {
            RemoteError::Rejected { status, message }
        }
    }

    /// Returns true if the same request may succeed later.
    ///
    /// ## Retryable
    /// - Connection failures and timeouts
    /// - 5xx responses
    /// - 408 and 429
    ///
    /// ## Non-Retryable
    /// - Any other 4xx (bad payload, auth)
    /// - Unparseable responses
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Connection(_) | RemoteError::Timeout(_) | RemoteError::Server { .. } => {
                true
            }
            RemoteError::Rejected { status, .. } => matches!(status, 408 | 429),
            RemoteError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::from_status(status.as_u16(), err.to_string())
        } else {
            RemoteError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::InvalidResponse(err.to_string())
    }
}

// =============================================================================
// Sync Errors
// =============================================================================

/// Sync error type covering checkout, queue and configuration failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid queue configuration.
    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),

    /// Invalid backend URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Backend section missing; required for anything that goes remote.
    #[error("Backend not configured. Set [backend] url and api_key.")]
    MissingBackend,

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Remote / Local
    // =========================================================================
    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local store failed. Aborts a drain.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Cart or catalog rule violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Queue Errors
    // =========================================================================
    /// Requeue asked for a record that is not in the Error state.
    #[error("Pending order {local_id} is not in the error state")]
    NotRequeueable { local_id: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Queue agent is shutting down.
    #[error("Queue agent is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Remote(err.into())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the failed operation can be retried as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote(err) => err.is_retryable(),
            SyncError::Database(DbError::PoolExhausted) => true,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::MissingBackend
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_remote_errors() {
        assert!(RemoteError::Connection("refused".into()).is_retryable());
        assert!(RemoteError::Timeout(30_000).is_retryable());
        assert!(RemoteError::from_status(503, "down").is_retryable());
        assert!(RemoteError::from_status(429, "slow down").is_retryable());

        assert!(!RemoteError::from_status(400, "bad payload").is_retryable());
        assert!(!RemoteError::from_status(401, "no auth").is_retryable());
        assert!(!RemoteError::InvalidResponse("not json".into()).is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            RemoteError::from_status(500, "x"),
            RemoteError::Server { status: 500, .. }
        ));
        assert!(matches!(
            RemoteError::from_status(409, "x"),
            RemoteError::Rejected { status: 409, .. }
        ));
    }

    #[test]
    fn test_sync_error_wraps_remote() {
        let err: SyncError = RemoteError::Timeout(5000).into();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Remote call timed out after 5000 ms");

        let err: SyncError = DbError::not_found("PendingOrder", "abc").into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::MissingBackend.is_config_error());
        assert!(SyncError::InvalidUrl("nope".into()).is_config_error());
        assert!(!SyncError::ShuttingDown.is_config_error());
    }
}
