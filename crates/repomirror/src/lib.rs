pub mod config;
pub mod db;
pub mod error;
pub mod remote;
pub mod request;
pub mod sync;

pub use config::MirrorConfig;
pub use db::{Database, DatabaseError, RepositoryRecord, SyncStatus};
pub use error::{Result, SyncError};
pub use remote::{BranchRef, CommitInfo, GitHubClient, MergeOutcome, RemoteGitClient};
pub use request::{SyncRequest, SyncResponse};
pub use sync::{
    BranchEnsurer, MergeStrategyExecutor, PushStrategy, RepositoryRegistry, StatusRecorder,
    SyncOrchestrator,
};
