//! End-to-end synchronization scenarios over the wire contract.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::params;

use repomirror::remote::InMemoryRemote;
use repomirror::{Database, SyncOrchestrator, SyncRequest, SyncStatus};

fn seed_repository(db: &Database, id: &str, url: &str, nickname: Option<&str>) {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO repositories (id, url, nickname) VALUES (?1, ?2, ?3)",
            params![id, url, nickname],
        )?;
        Ok(())
    })
    .unwrap();
}

fn find(db: &Database, id: &str) -> repomirror::RepositoryRecord {
    repomirror::db::repo_store::find_by_id(db, id)
        .unwrap()
        .unwrap()
}

fn setup() -> (Database, Arc<InMemoryRemote>, SyncOrchestrator) {
    let db = Database::open_in_memory().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let orchestrator = SyncOrchestrator::new(db.clone(), remote.clone());
    (db, remote, orchestrator)
}

#[tokio::test]
async fn force_push_to_target_without_branch() {
    let (db, remote, orchestrator) = setup();
    seed_repository(&db, "src", "https://github.com/acme/app.git", Some("app"));
    seed_repository(&db, "dst", "https://github.com/acme/mirror.git", None);
    remote.add_repo("acme", "app", "main");
    remote.set_branch("acme", "app", "main", "abc123");
    remote.add_repo("acme", "mirror", "main");

    let request: SyncRequest = serde_json::from_str(
        r#"{"type": "push", "sourceRepoId": "src", "targetRepoId": "dst", "pushType": "force"}"#,
    )
    .unwrap();
    let response = orchestrator.handle(request).await;

    assert!(response.success);
    assert_eq!(response.sha.as_deref(), Some("abc123"));

    // Branch was created at the source SHA, then force-updated (a no-op).
    assert_eq!(remote.create_branch_calls(), 1);
    assert_eq!(remote.force_update_calls(), 1);
    assert_eq!(
        remote.branch_sha("acme", "mirror", "main").as_deref(),
        Some("abc123")
    );

    // Both records share the terminal state.
    let source = find(&db, "src");
    let target = find(&db, "dst");
    for record in [&source, &target] {
        assert_eq!(record.status, SyncStatus::Synced);
        assert_eq!(record.last_commit.as_deref(), Some("abc123"));
    }
    assert_eq!(source.last_sync, target.last_sync);
    assert!(source.last_sync.is_some());
}

#[tokio::test]
async fn merge_push_with_incompatible_histories() {
    let (db, remote, orchestrator) = setup();
    seed_repository(&db, "src", "https://github.com/acme/app.git", None);
    seed_repository(&db, "dst", "https://github.com/acme/mirror.git", None);
    remote.add_repo("acme", "app", "main");
    remote.set_branch("acme", "app", "main", "abc123");
    remote.add_repo("acme", "mirror", "main");
    remote.set_branch("acme", "mirror", "main", "def456");
    remote.set_unrelated_histories("acme", "mirror");

    let request: SyncRequest = serde_json::from_str(
        r#"{"type": "push", "sourceRepoId": "src", "targetRepoId": "dst", "pushType": "merge"}"#,
    )
    .unwrap();
    let response = orchestrator.handle(request).await;

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("MergeConflict"));
    assert!(response.sha.is_none());

    // Neither record's commit fields changed.
    for id in ["src", "dst"] {
        let record = find(&db, id);
        assert!(record.last_commit.is_none());
        assert_eq!(record.status, SyncStatus::Error);
    }
    assert_eq!(
        remote.branch_sha("acme", "mirror", "main").as_deref(),
        Some("def456")
    );
}

#[tokio::test]
async fn get_last_commit_response_carries_provider_shape() {
    let (db, remote, orchestrator) = setup();
    seed_repository(&db, "src", "https://github.com/acme/app.git", None);
    remote.add_repo("acme", "app", "main");
    remote.set_branch("acme", "app", "main", "abc123");
    remote.set_commit_date("abc123", Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());

    let request: SyncRequest =
        serde_json::from_str(r#"{"type": "getLastCommit", "sourceRepoId": "src"}"#).unwrap();
    let response = orchestrator.handle(request).await;

    assert!(response.success);
    let commit = response.commit.unwrap();
    assert_eq!(commit["sha"], "abc123");
    assert!(commit["commit"]["author"]["date"].is_string());

    let record = find(&db, "src");
    assert_eq!(record.status, SyncStatus::Synced);
    assert_eq!(record.last_commit.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn unknown_repository_fails_as_normal_response() {
    let (_db, _remote, orchestrator) = setup();

    let request: SyncRequest =
        serde_json::from_str(r#"{"type": "getLastCommit", "sourceRepoId": "ghost"}"#).unwrap();
    let response = orchestrator.handle(request).await;

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("NotFound"));
}

#[tokio::test]
async fn concurrent_pushes_to_same_target_both_complete() {
    let (db, remote, orchestrator) = setup();
    seed_repository(&db, "src", "https://github.com/acme/app.git", None);
    seed_repository(&db, "dst", "https://github.com/acme/mirror.git", None);
    remote.add_repo("acme", "app", "main");
    remote.set_branch("acme", "app", "main", "abc123");
    remote.add_repo("acme", "mirror", "main");

    let (a, b) = tokio::join!(
        orchestrator.push("src", "dst", repomirror::PushStrategy::Force),
        orchestrator.push("src", "dst", repomirror::PushStrategy::Force),
    );
    assert_eq!(a.unwrap(), "abc123");
    assert_eq!(b.unwrap(), "abc123");

    assert_eq!(
        remote.branch_sha("acme", "mirror", "main").as_deref(),
        Some("abc123")
    );
    assert_eq!(find(&db, "dst").status, SyncStatus::Synced);
}
