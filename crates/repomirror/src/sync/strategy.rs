//! Push strategy selection and execution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::remote::RemoteGitClient;

/// How the target ref is updated during a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushStrategy {
    /// Provider-side merge of the source head into the target branch.
    Merge,
    /// Unconditional ref overwrite.
    Force,
    /// Accepted as a distinct strategy but currently applied as an
    /// unconditional overwrite, identical to `Force`. A true lease would
    /// compare the target's observed SHA against an expected value and
    /// abort on mismatch; the executor does not do that yet.
    ForceWithLease,
}

impl PushStrategy {
    /// Wire name, also used in generated merge messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushStrategy::Merge => "merge",
            PushStrategy::Force => "force",
            PushStrategy::ForceWithLease => "force-with-lease",
        }
    }
}

impl fmt::Display for PushStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies exactly one strategy to a target branch.
pub struct MergeStrategyExecutor<'a> {
    remote: &'a dyn RemoteGitClient,
}

impl<'a> MergeStrategyExecutor<'a> {
    pub fn new(remote: &'a dyn RemoteGitClient) -> Self {
        Self { remote }
    }

    /// Updates `owner/repo@branch` to incorporate `source_sha` and returns
    /// the resulting SHA: the source SHA for the force paths, the merge
    /// commit SHA (or the source SHA when fast-forwarded) for merge.
    pub async fn apply(
        &self,
        strategy: PushStrategy,
        owner: &str,
        repo: &str,
        branch: &str,
        source_sha: &str,
        message: &str,
    ) -> Result<String> {
        match strategy {
            PushStrategy::Force | PushStrategy::ForceWithLease => {
                log::info!(
                    "Force-updating {}/{}@{} to {} ({})",
                    owner,
                    repo,
                    branch,
                    source_sha,
                    strategy
                );
                self.remote
                    .force_update_branch(owner, repo, branch, source_sha)
                    .await?;
                Ok(source_sha.to_string())
            }
            PushStrategy::Merge => {
                log::info!("Merging {} into {}/{}@{}", source_sha, owner, repo, branch);
                let outcome = self
                    .remote
                    .merge_branch(owner, repo, branch, source_sha, message)
                    .await?;
                if outcome.fast_forwarded {
                    log::debug!("Base already contained {}, nothing to merge", source_sha);
                }
                Ok(outcome.sha)
            }
        }
    }
}
