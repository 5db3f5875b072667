//! Idempotent branch ensuring on the target repository.

use crate::error::{Result, SyncError};
use crate::remote::{BranchRef, RemoteGitClient};

/// Guarantees a named branch exists on a repository, creating it from a
/// fallback commit when absent. The only component allowed to create a
/// branch.
pub struct BranchEnsurer<'a> {
    remote: &'a dyn RemoteGitClient,
}

impl<'a> BranchEnsurer<'a> {
    pub fn new(remote: &'a dyn RemoteGitClient) -> Self {
        Self { remote }
    }

    /// Reads the branch; on `RemoteNotFound` creates it at `fallback_sha`
    /// and re-reads. Any other read failure propagates unchanged.
    ///
    /// Idempotent: when the branch already exists only the read happens.
    pub async fn ensure(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        fallback_sha: &str,
    ) -> Result<BranchRef> {
        match self.remote.get_branch(owner, repo, branch).await {
            Ok(branch_ref) => Ok(branch_ref),
            Err(SyncError::RemoteNotFound { .. }) => {
                log::info!(
                    "Branch {} missing on {}/{}, creating at {}",
                    branch,
                    owner,
                    repo,
                    fallback_sha
                );
                self.remote
                    .create_branch(owner, repo, branch, fallback_sha)
                    .await?;
                self.remote.get_branch(owner, repo, branch).await
            }
            Err(e) => Err(e),
        }
    }
}
