//! Wire-level request and response types.
//!
//! The request is a closed tagged union: a push without a target id or
//! strategy fails deserialization at the boundary, before any collaborator
//! is invoked. Handled errors and successes both serialize as a normal
//! response body.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::remote::CommitInfo;
use crate::sync::PushStrategy;

/// A synchronization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyncRequest {
    /// Fetch the head commit of the source's default branch.
    GetLastCommit { source_repo_id: String },
    /// Mirror the source's default branch head onto the target.
    Push {
        source_repo_id: String,
        target_repo_id: String,
        push_type: PushStrategy,
    },
}

/// A synchronization response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Commit payload for `getLastCommit`, in the provider's shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<serde_json::Value>,
    /// Resulting SHA for `push`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Error code from the taxonomy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider detail payload, when one was returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SyncResponse {
    /// Success response for `getLastCommit`.
    pub fn last_commit(commit: &CommitInfo) -> Self {
        Self {
            success: true,
            message: None,
            commit: Some(serde_json::json!({
                "sha": commit.sha,
                "commit": { "author": { "date": commit.author_date } },
            })),
            sha: None,
            error: None,
            details: None,
        }
    }

    /// Success response for `push`.
    pub fn pushed(sha: String) -> Self {
        Self {
            success: true,
            message: Some("Push operation completed successfully".to_string()),
            commit: None,
            sha: Some(sha),
            error: None,
            details: None,
        }
    }

    /// Failure response carrying the error code, message, and any
    /// provider detail payload.
    pub fn failure(error: &SyncError) -> Self {
        Self {
            success: false,
            message: Some(error.to_string()),
            commit: None,
            sha: None,
            error: Some(error.code().to_string()),
            details: error.details().cloned(),
        }
    }
}
