//! Pure data types for remote provider operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Content-addressed commit identifier.
    pub sha: String,
    /// Author date, when the provider reports one.
    pub author_date: Option<DateTime<Utc>>,
}

/// A named ref pointing at a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
    /// Branch name.
    pub name: String,
    /// Commit SHA the branch currently points to.
    pub sha: String,
}

/// Outcome of a provider-side merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// The merge commit SHA, or the head SHA when the base already
    /// contained it.
    pub sha: String,
    /// Whether the base advanced without a new merge commit.
    pub fast_forwarded: bool,
}
