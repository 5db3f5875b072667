//! Synchronization orchestration.
//!
//! The orchestration pipeline, leaves first: identity resolution,
//! idempotent branch ensuring, strategy execution, status persistence,
//! and the top-level orchestrator tying them together.

pub mod ensure;
pub mod orchestrator;
pub mod registry;
pub mod status;
pub mod strategy;

pub use ensure::BranchEnsurer;
pub use orchestrator::SyncOrchestrator;
pub use registry::{parse_owner_repo, RepositoryRegistry, ResolvedRepository};
pub use status::StatusRecorder;
pub use strategy::{MergeStrategyExecutor, PushStrategy};
