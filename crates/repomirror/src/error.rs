//! Error types for synchronization operations.
//!
//! Every remote failure is classified once, at the HTTP response boundary,
//! into one of these variants. Nothing downstream inspects error message
//! text to decide behavior.

use thiserror::Error;

use crate::db::DatabaseError;

/// Errors that can occur during a synchronization operation.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The repository id has no record in the store.
    #[error("Repository not found: {id}")]
    NotFound { id: String },

    /// The stored URL does not decompose into `host/owner/repo`.
    #[error("Invalid repository URL format: {url}")]
    InvalidUrlFormat { url: String },

    /// Provider credentials were missing or unreadable at startup.
    #[error("Provider credentials not configured: {reason}")]
    AuthConfiguration { reason: String },

    /// The provider returned 404 for a branch/ref lookup. Recoverable
    /// during branch ensuring; fatal everywhere else.
    #[error("Remote object not found during {operation}")]
    RemoteNotFound { operation: &'static str },

    /// The provider could not produce a fast-forward or clean merge.
    #[error("Merge conflict: {message}")]
    MergeConflict {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A force ref update was rejected by the provider.
    #[error("Force update failed: {message}")]
    ForceUpdateFailure {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Any other remote call failure (network error, 5xx, unexpected
    /// payload). Propagated unchanged, tagged with the failing operation.
    #[error("Remote call {operation} failed: {message}")]
    Transient {
        operation: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Persistence failure in the status store.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl SyncError {
    /// Stable error code for the wire response.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::NotFound { .. } => "NotFound",
            SyncError::InvalidUrlFormat { .. } => "InvalidUrlFormat",
            SyncError::AuthConfiguration { .. } => "AuthConfigurationError",
            SyncError::RemoteNotFound { .. } => "RemoteNotFound",
            SyncError::MergeConflict { .. } => "MergeConflict",
            SyncError::ForceUpdateFailure { .. } => "ForceUpdateFailure",
            SyncError::Transient { .. } => "TransientNetworkError",
            SyncError::Database(_) => "DatabaseError",
        }
    }

    /// Provider detail payload, when the remote returned one.
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            SyncError::MergeConflict { details, .. }
            | SyncError::ForceUpdateFailure { details, .. }
            | SyncError::Transient { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_taxonomy() {
        let conflict = SyncError::MergeConflict {
            message: "merge conflict".into(),
            details: None,
        };
        let transient = SyncError::Transient {
            operation: "merge_branch",
            message: "connection reset".into(),
            details: None,
        };
        assert_eq!(conflict.code(), "MergeConflict");
        assert_eq!(transient.code(), "TransientNetworkError");
        assert_ne!(conflict.code(), transient.code());
    }

    #[test]
    fn test_details_only_on_remote_failures() {
        let err = SyncError::Transient {
            operation: "get_branch",
            message: "bad gateway".into(),
            details: Some(serde_json::json!({"message": "Bad Gateway"})),
        };
        assert!(err.details().is_some());

        let err = SyncError::NotFound { id: "r1".into() };
        assert!(err.details().is_none());
    }
}
