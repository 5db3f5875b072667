//! Remote provider operations for repository mirroring.
//!
//! The [`RemoteGitClient`] trait is a thin typed surface over the
//! provider's commit/branch/ref/merge endpoints. Implementations carry no
//! business logic: every call is a single network round trip whose failure
//! propagates unchanged, tagged with the operation name. There are no
//! retries and no caching.

pub mod github;
pub mod memory;
pub mod types;

pub use github::GitHubClient;
pub use memory::InMemoryRemote;
pub use types::{BranchRef, CommitInfo, MergeOutcome};

use crate::error::Result;

/// Typed interface over the provider's git API.
#[async_trait::async_trait]
pub trait RemoteGitClient: Send + Sync {
    /// Returns the repository's default branch name.
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String>;

    /// Returns the commit a ref (branch name or SHA) resolves to.
    async fn get_commit(&self, owner: &str, repo: &str, git_ref: &str) -> Result<CommitInfo>;

    /// Returns the branch ref. Fails with `RemoteNotFound` if absent.
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchRef>;

    /// Creates `refs/heads/{branch}` pointing at `sha`.
    async fn create_branch(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()>;

    /// Unconditionally repoints `refs/heads/{branch}` at `sha`, discarding
    /// any commits not reachable from it.
    async fn force_update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<()>;

    /// Merges `head_sha` into `base`. Fails with `MergeConflict` when the
    /// provider reports conflicting histories.
    async fn merge_branch(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head_sha: &str,
        message: &str,
    ) -> Result<MergeOutcome>;
}
