//! Scripted in-memory provider.
//!
//! Implements [`RemoteGitClient`] over plain maps so orchestration logic
//! can be exercised without a network. Used by unit and integration tests;
//! records call counts so idempotence properties can be asserted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::types::{BranchRef, CommitInfo, MergeOutcome};
use super::RemoteGitClient;
use crate::error::{Result, SyncError};

#[derive(Default)]
struct RepoState {
    default_branch: String,
    /// branch name -> commit SHA
    branches: HashMap<String, String>,
    /// When set, merges into this repository report conflicting histories.
    unrelated_histories: bool,
}

#[derive(Default)]
struct State {
    /// keyed by "owner/repo"
    repos: HashMap<String, RepoState>,
    /// commit SHA -> author date
    commit_dates: HashMap<String, DateTime<Utc>>,
    /// Operations that fail with an injected transient error.
    fail_operations: HashSet<&'static str>,
    remote_calls: u32,
    create_branch_calls: u32,
    force_update_calls: u32,
    merge_calls: u32,
}

/// In-memory [`RemoteGitClient`] for tests.
#[derive(Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository with the given default branch.
    pub fn add_repo(&self, owner: &str, repo: &str, default_branch: &str) {
        let mut state = self.state.lock().unwrap();
        state.repos.insert(
            key(owner, repo),
            RepoState {
                default_branch: default_branch.to_string(),
                ..RepoState::default()
            },
        );
    }

    /// Points a branch at a commit, creating it if needed.
    pub fn set_branch(&self, owner: &str, repo: &str, branch: &str, sha: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(repo_state) = state.repos.get_mut(&key(owner, repo)) {
            repo_state
                .branches
                .insert(branch.to_string(), sha.to_string());
        }
    }

    /// Records an author date for a commit SHA.
    pub fn set_commit_date(&self, sha: &str, date: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap()
            .commit_dates
            .insert(sha.to_string(), date);
    }

    /// Makes merges into this repository report conflicting histories.
    pub fn set_unrelated_histories(&self, owner: &str, repo: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(repo_state) = state.repos.get_mut(&key(owner, repo)) {
            repo_state.unrelated_histories = true;
        }
    }

    /// Injects a transient failure for the named operation.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().fail_operations.insert(operation);
    }

    /// Current SHA of a branch, for assertions.
    pub fn branch_sha(&self, owner: &str, repo: &str, branch: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(&key(owner, repo))
            .and_then(|r| r.branches.get(branch).cloned())
    }

    pub fn create_branch_calls(&self) -> u32 {
        self.state.lock().unwrap().create_branch_calls
    }

    pub fn force_update_calls(&self) -> u32 {
        self.state.lock().unwrap().force_update_calls
    }

    pub fn merge_calls(&self) -> u32 {
        self.state.lock().unwrap().merge_calls
    }

    /// Total number of trait invocations, across all operations.
    pub fn remote_calls(&self) -> u32 {
        self.state.lock().unwrap().remote_calls
    }

    /// Counts the call and applies any injected failure.
    fn check_fail(&self, operation: &'static str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.remote_calls += 1;
        if state.fail_operations.contains(operation) {
            return Err(SyncError::Transient {
                operation,
                message: "injected failure".to_string(),
                details: None,
            });
        }
        Ok(())
    }
}

fn key(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner, repo)
}

#[async_trait::async_trait]
impl RemoteGitClient for InMemoryRemote {
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        self.check_fail("default_branch")?;
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(&key(owner, repo))
            .map(|r| r.default_branch.clone())
            .ok_or(SyncError::RemoteNotFound {
                operation: "default_branch",
            })
    }

    async fn get_commit(&self, owner: &str, repo: &str, git_ref: &str) -> Result<CommitInfo> {
        self.check_fail("get_commit")?;
        let state = self.state.lock().unwrap();
        let repo_state =
            state
                .repos
                .get(&key(owner, repo))
                .ok_or(SyncError::RemoteNotFound {
                    operation: "get_commit",
                })?;

        // A branch name resolves through the ref map; anything else is
        // taken to be a commit SHA.
        let sha = repo_state
            .branches
            .get(git_ref)
            .cloned()
            .unwrap_or_else(|| git_ref.to_string());

        Ok(CommitInfo {
            author_date: state.commit_dates.get(&sha).copied(),
            sha,
        })
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchRef> {
        self.check_fail("get_branch")?;
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(&key(owner, repo))
            .and_then(|r| r.branches.get(branch))
            .map(|sha| BranchRef {
                name: branch.to_string(),
                sha: sha.clone(),
            })
            .ok_or(SyncError::RemoteNotFound {
                operation: "get_branch",
            })
    }

    async fn create_branch(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()> {
        self.check_fail("create_branch")?;
        let mut state = self.state.lock().unwrap();
        state.create_branch_calls += 1;
        let repo_state =
            state
                .repos
                .get_mut(&key(owner, repo))
                .ok_or(SyncError::RemoteNotFound {
                    operation: "create_branch",
                })?;
        if repo_state.branches.contains_key(branch) {
            return Err(SyncError::Transient {
                operation: "create_branch",
                message: "Reference already exists".to_string(),
                details: None,
            });
        }
        repo_state
            .branches
            .insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn force_update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        self.check_fail("force_update_branch")?;
        let mut state = self.state.lock().unwrap();
        state.force_update_calls += 1;
        let repo_state =
            state
                .repos
                .get_mut(&key(owner, repo))
                .ok_or(SyncError::RemoteNotFound {
                    operation: "force_update_branch",
                })?;
        repo_state
            .branches
            .insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn merge_branch(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head_sha: &str,
        _message: &str,
    ) -> Result<MergeOutcome> {
        self.check_fail("merge_branch")?;
        let mut state = self.state.lock().unwrap();
        state.merge_calls += 1;
        let repo_state =
            state
                .repos
                .get_mut(&key(owner, repo))
                .ok_or(SyncError::RemoteNotFound {
                    operation: "merge_branch",
                })?;

        if repo_state.unrelated_histories {
            return Err(SyncError::MergeConflict {
                message: "Merge conflict".to_string(),
                details: Some(serde_json::json!({"message": "Merge conflict"})),
            });
        }

        let base_sha =
            repo_state
                .branches
                .get(base)
                .cloned()
                .ok_or(SyncError::RemoteNotFound {
                    operation: "merge_branch",
                })?;

        if base_sha == head_sha {
            return Ok(MergeOutcome {
                sha: head_sha.to_string(),
                fast_forwarded: true,
            });
        }

        let merge_sha = format!("merge-{}", &head_sha[..head_sha.len().min(7)]);
        repo_state
            .branches
            .insert(base.to_string(), merge_sha.clone());
        Ok(MergeOutcome {
            sha: merge_sha,
            fast_forwarded: false,
        })
    }
}
