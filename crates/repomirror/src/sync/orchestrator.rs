//! Top-level synchronization orchestration.
//!
//! Composes the registry, branch ensurer, strategy executor, and status
//! recorder into the two supported operations. Each invocation is a
//! sequential chain of remote calls; a stage failure short-circuits the
//! rest and already-completed remote side effects are not rolled back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::ensure::BranchEnsurer;
use super::registry::{RepositoryRegistry, ResolvedRepository};
use super::status::StatusRecorder;
use super::strategy::{MergeStrategyExecutor, PushStrategy};
use crate::db::Database;
use crate::error::Result;
use crate::remote::{CommitInfo, RemoteGitClient};
use crate::request::{SyncRequest, SyncResponse};

/// Entry point for synchronization operations.
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteGitClient>,
    registry: RepositoryRegistry,
    recorder: StatusRecorder,
    /// Advisory locks keyed by target repository id. A push holds its
    /// target's lock for the whole operation so concurrent pushes to the
    /// same target cannot race on the remote ref or the status fields.
    push_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SyncOrchestrator {
    pub fn new(db: Database, remote: Arc<dyn RemoteGitClient>) -> Self {
        Self {
            remote,
            registry: RepositoryRegistry::new(db.clone()),
            recorder: StatusRecorder::new(db),
            push_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatches a wire-level request. Handled errors come back as a
    /// normal failure response carrying the error code and provider
    /// details.
    pub async fn handle(&self, request: SyncRequest) -> SyncResponse {
        match request {
            SyncRequest::GetLastCommit { source_repo_id } => {
                match self.fetch_latest_commit(&source_repo_id).await {
                    Ok(commit) => SyncResponse::last_commit(&commit),
                    Err(e) => {
                        log::error!("getLastCommit for {} failed: {}", source_repo_id, e);
                        SyncResponse::failure(&e)
                    }
                }
            }
            SyncRequest::Push {
                source_repo_id,
                target_repo_id,
                push_type,
            } => {
                match self
                    .push(&source_repo_id, &target_repo_id, push_type)
                    .await
                {
                    Ok(sha) => SyncResponse::pushed(sha),
                    Err(e) => {
                        log::error!(
                            "push from {} to {} failed: {}",
                            source_repo_id,
                            target_repo_id,
                            e
                        );
                        SyncResponse::failure(&e)
                    }
                }
            }
        }
    }

    /// Resolves the source, reads the head of its default branch, and
    /// records the result on the source record.
    pub async fn fetch_latest_commit(&self, source_id: &str) -> Result<CommitInfo> {
        let source = self.registry.resolve(source_id)?;
        let ids = [source_id];
        self.recorder.mark_syncing(&ids)?;

        match self.fetch_stages(&source).await {
            Ok(commit) => {
                self.recorder
                    .record_success(&ids, &commit.sha, commit.author_date, Utc::now())?;
                log::info!("Latest commit on {} is {}", source_id, commit.sha);
                Ok(commit)
            }
            Err(e) => {
                self.mark_error_best_effort(&ids);
                Err(e)
            }
        }
    }

    /// Mirrors the source's default branch head onto the target using the
    /// given strategy and records the outcome on both records.
    pub async fn push(
        &self,
        source_id: &str,
        target_id: &str,
        strategy: PushStrategy,
    ) -> Result<String> {
        let lock = self.target_lock(target_id).await;
        let _guard = lock.lock().await;

        let source = self.registry.resolve(source_id)?;
        let target = self.registry.resolve(target_id)?;
        let ids = [source_id, target_id];
        self.recorder.mark_syncing(&ids)?;

        match self.push_stages(&source, &target, strategy).await {
            Ok((sha, commit_date)) => {
                self.recorder
                    .record_success(&ids, &sha, commit_date, Utc::now())?;
                log::info!(
                    "Push from {} to {} completed at {}",
                    source_id,
                    target_id,
                    sha
                );
                Ok(sha)
            }
            Err(e) => {
                self.mark_error_best_effort(&ids);
                Err(e)
            }
        }
    }

    async fn fetch_stages(&self, source: &ResolvedRepository) -> Result<CommitInfo> {
        let branch = self
            .remote
            .default_branch(&source.owner, &source.repo)
            .await?;
        self.remote
            .get_commit(&source.owner, &source.repo, &branch)
            .await
    }

    async fn push_stages(
        &self,
        source: &ResolvedRepository,
        target: &ResolvedRepository,
        strategy: PushStrategy,
    ) -> Result<(String, Option<DateTime<Utc>>)> {
        let source_branch = self
            .remote
            .default_branch(&source.owner, &source.repo)
            .await?;
        let head = self
            .remote
            .get_commit(&source.owner, &source.repo, &source_branch)
            .await?;

        // The target mirrors the source's default branch by name.
        let ensurer = BranchEnsurer::new(self.remote.as_ref());
        let target_branch = ensurer
            .ensure(&target.owner, &target.repo, &source_branch, &head.sha)
            .await?;
        log::debug!(
            "Target branch {} currently at {}",
            target_branch.name,
            target_branch.sha
        );

        let message = format!(
            "Merge from {} using {} strategy",
            source.record.display_name(),
            strategy
        );
        let executor = MergeStrategyExecutor::new(self.remote.as_ref());
        let sha = executor
            .apply(
                strategy,
                &target.owner,
                &target.repo,
                &target_branch.name,
                &head.sha,
                &message,
            )
            .await?;

        Ok((sha, head.author_date))
    }

    /// Returns the advisory lock for a target repository, creating it on
    /// first use.
    async fn target_lock(&self, target_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.push_locks.lock().await;
        locks.entry(target_id.to_string()).or_default().clone()
    }

    fn mark_error_best_effort(&self, ids: &[&str]) {
        if let Err(e) = self.recorder.mark_error(ids) {
            log::warn!("Failed to record error status: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{repo_store, SyncStatus};
    use crate::error::SyncError;
    use crate::remote::InMemoryRemote;
    use chrono::TimeZone;
    use rusqlite::params;

    fn seed(db: &Database, id: &str, url: &str, nickname: Option<&str>) {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO repositories (id, url, nickname) VALUES (?1, ?2, ?3)",
                params![id, url, nickname],
            )?;
            Ok(())
        })
        .unwrap();
    }

    fn setup() -> (Database, Arc<InMemoryRemote>, SyncOrchestrator) {
        let db = Database::open_in_memory().unwrap();
        let remote = Arc::new(InMemoryRemote::new());
        let orchestrator = SyncOrchestrator::new(db.clone(), remote.clone());
        (db, remote, orchestrator)
    }

    #[tokio::test]
    async fn test_fetch_latest_commit_records_success_once() {
        let (db, remote, orchestrator) = setup();
        seed(&db, "src", "https://github.com/acme/app.git", None);
        remote.add_repo("acme", "app", "main");
        remote.set_branch("acme", "app", "main", "abc123");
        remote.set_commit_date(
            "abc123",
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        );

        let commit = orchestrator.fetch_latest_commit("src").await.unwrap();
        assert_eq!(commit.sha, "abc123");

        let record = repo_store::find_by_id(&db, "src").unwrap().unwrap();
        assert_eq!(record.status, SyncStatus::Synced);
        assert_eq!(record.last_commit.as_deref(), Some("abc123"));
        assert_eq!(
            record.last_commit_date.as_deref(),
            Some("2026-01-02T03:04:05Z")
        );
        assert!(record.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_commit_fields_untouched() {
        let (db, remote, orchestrator) = setup();
        seed(&db, "src", "https://github.com/acme/app.git", None);
        remote.add_repo("acme", "app", "main");
        remote.set_branch("acme", "app", "main", "abc123");
        remote.fail_on("get_commit");

        let err = orchestrator.fetch_latest_commit("src").await.unwrap_err();
        assert!(matches!(err, SyncError::Transient { .. }));

        let record = repo_store::find_by_id(&db, "src").unwrap().unwrap();
        assert_eq!(record.status, SyncStatus::Error);
        assert!(record.last_commit.is_none());
        assert!(record.last_commit_date.is_none());
        assert!(record.last_sync.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_any_remote_call() {
        let (db, remote, orchestrator) = setup();
        seed(&db, "src", "not-a-repository-url", None);
        seed(&db, "dst", "https://github.com/acme/mirror.git", None);

        let err = orchestrator
            .push("src", "dst", PushStrategy::Force)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidUrlFormat { .. }));
        assert_eq!(remote.remote_calls(), 0);

        // Resolution failed before mark_syncing: records stay idle.
        let record = repo_store::find_by_id(&db, "src").unwrap().unwrap();
        assert_eq!(record.status, SyncStatus::Idle);
    }

    #[tokio::test]
    async fn test_unknown_source_is_not_found() {
        let (_db, _remote, orchestrator) = setup();
        let err = orchestrator.fetch_latest_commit("nope").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_force_push_creates_branch_and_records_both() {
        let (db, remote, orchestrator) = setup();
        seed(&db, "src", "https://github.com/acme/app.git", Some("app"));
        seed(&db, "dst", "https://github.com/acme/mirror.git", None);
        remote.add_repo("acme", "app", "main");
        remote.set_branch("acme", "app", "main", "abc123");
        remote.add_repo("acme", "mirror", "main");
        // Target has no main branch yet.

        let sha = orchestrator
            .push("src", "dst", PushStrategy::Force)
            .await
            .unwrap();
        assert_eq!(sha, "abc123");

        assert_eq!(remote.create_branch_calls(), 1);
        assert_eq!(remote.force_update_calls(), 1);
        assert_eq!(
            remote.branch_sha("acme", "mirror", "main").as_deref(),
            Some("abc123")
        );

        let source = repo_store::find_by_id(&db, "src").unwrap().unwrap();
        let target = repo_store::find_by_id(&db, "dst").unwrap().unwrap();
        for record in [&source, &target] {
            assert_eq!(record.status, SyncStatus::Synced);
            assert_eq!(record.last_commit.as_deref(), Some("abc123"));
        }
        assert_eq!(source.last_sync, target.last_sync);
        assert!(source.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_merge_conflict_push_leaves_commits_unchanged() {
        let (db, remote, orchestrator) = setup();
        seed(&db, "src", "https://github.com/acme/app.git", None);
        seed(&db, "dst", "https://github.com/acme/mirror.git", None);
        remote.add_repo("acme", "app", "main");
        remote.set_branch("acme", "app", "main", "abc123");
        remote.add_repo("acme", "mirror", "main");
        remote.set_branch("acme", "mirror", "main", "def456");
        remote.set_unrelated_histories("acme", "mirror");

        let err = orchestrator
            .push("src", "dst", PushStrategy::Merge)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::MergeConflict { .. }));

        for id in ["src", "dst"] {
            let record = repo_store::find_by_id(&db, id).unwrap().unwrap();
            assert_eq!(record.status, SyncStatus::Error);
            assert!(record.last_commit.is_none());
        }
        // The target branch still points at its old head.
        assert_eq!(
            remote.branch_sha("acme", "mirror", "main").as_deref(),
            Some("def456")
        );
    }

    #[tokio::test]
    async fn test_branch_created_before_merge_failure_is_not_rolled_back() {
        let (db, remote, orchestrator) = setup();
        seed(&db, "src", "https://github.com/acme/app.git", None);
        seed(&db, "dst", "https://github.com/acme/mirror.git", None);
        remote.add_repo("acme", "app", "main");
        remote.set_branch("acme", "app", "main", "abc123");
        remote.add_repo("acme", "mirror", "main");
        remote.fail_on("force_update_branch");

        let err = orchestrator
            .push("src", "dst", PushStrategy::Force)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transient { .. }));

        // Branch ensuring already ran; its side effect survives.
        assert_eq!(
            remote.branch_sha("acme", "mirror", "main").as_deref(),
            Some("abc123")
        );
        let record = repo_store::find_by_id(&db, "dst").unwrap().unwrap();
        assert_eq!(record.status, SyncStatus::Error);
    }

    #[tokio::test]
    async fn test_target_lock_is_shared_per_id() {
        let (_db, _remote, orchestrator) = setup();
        let a = orchestrator.target_lock("dst").await;
        let b = orchestrator.target_lock("dst").await;
        let c = orchestrator.target_lock("other").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
