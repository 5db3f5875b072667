//! Sync status persistence.
//!
//! Writes the `status`, `last_commit`, `last_commit_date`, and `last_sync`
//! fields on repository records. Commit fields change only on the
//! successful terminal transition to `synced`; the error path touches
//! status alone.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::{repo_store, Database, SyncStatus};
use crate::error::Result;

/// Records sync outcomes onto repository records.
pub struct StatusRecorder {
    db: Database,
}

impl StatusRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Marks the records as `syncing`. Status only.
    pub fn mark_syncing(&self, ids: &[&str]) -> Result<()> {
        repo_store::set_status(&self.db, ids, SyncStatus::Syncing)?;
        Ok(())
    }

    /// Marks the records as `error`. Status only; previously persisted
    /// commit fields stay as they were.
    pub fn mark_error(&self, ids: &[&str]) -> Result<()> {
        repo_store::set_status(&self.db, ids, SyncStatus::Error)?;
        Ok(())
    }

    /// Terminal success transition: every record in `ids` gets
    /// `status=synced`, the resulting SHA, the commit date, and the same
    /// `last_sync` timestamp.
    pub fn record_success(
        &self,
        ids: &[&str],
        sha: &str,
        commit_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let commit_date = commit_date.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true));
        repo_store::record_synced(
            &self.db,
            ids,
            sha,
            commit_date.as_deref(),
            &now.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        Ok(())
    }
}
