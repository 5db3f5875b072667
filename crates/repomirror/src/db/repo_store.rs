//! Repository store — reads and sync-state updates for the `repositories`
//! table.
//!
//! Records are created and deleted by the dashboard; this core only reads
//! them and updates their synchronization fields.

use rusqlite::{params, params_from_iter, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DatabaseError};

/// Synchronization status of a repository record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Error,
}

impl SyncStatus {
    /// Stable string form stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }

    /// Parses a stored status value. Unknown values map to `Idle` so a
    /// record touched by an older dashboard build stays usable.
    pub fn parse(s: &str) -> Self {
        match s {
            "syncing" => SyncStatus::Syncing,
            "synced" => SyncStatus::Synced,
            "error" => SyncStatus::Error,
            _ => SyncStatus::Idle,
        }
    }
}

/// A repository record row.
#[derive(Debug, Clone)]
pub struct RepositoryRecord {
    pub id: String,
    pub url: String,
    pub nickname: Option<String>,
    pub last_commit: Option<String>,
    pub last_commit_date: Option<String>,
    pub last_sync: Option<String>,
    pub status: SyncStatus,
}

impl RepositoryRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            url: row.get("url")?,
            nickname: row.get("nickname")?,
            last_commit: row.get("last_commit")?,
            last_commit_date: row.get("last_commit_date")?,
            last_sync: row.get("last_sync")?,
            status: SyncStatus::parse(&status),
        })
    }

    /// Display name for merge messages: nickname when set, URL otherwise.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.url)
    }
}

/// Finds a repository record by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<RepositoryRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM repositories WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], RepositoryRecord::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Sets the status on every record in `ids`. Other fields are untouched.
pub fn set_status(db: &Database, ids: &[&str], status: SyncStatus) -> Result<(), DatabaseError> {
    if ids.is_empty() {
        return Ok(());
    }
    db.with_conn(|conn| {
        let sql = format!(
            "UPDATE repositories SET status = ?1 WHERE id IN ({})",
            in_placeholders(2, ids.len())
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(status.as_str())];
        values.extend(ids.iter().map(|id| Box::new(id.to_string()) as _));
        conn.execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))?;
        Ok(())
    })
}

/// Records a successful sync on every record in `ids`: status becomes
/// `synced` and the commit/timestamp fields are overwritten in a single
/// statement, so all records share the same values.
pub fn record_synced(
    db: &Database,
    ids: &[&str],
    sha: &str,
    commit_date: Option<&str>,
    last_sync: &str,
) -> Result<(), DatabaseError> {
    if ids.is_empty() {
        return Ok(());
    }
    db.with_conn(|conn| {
        let sql = format!(
            "UPDATE repositories
             SET status = 'synced', last_commit = ?1, last_commit_date = ?2, last_sync = ?3
             WHERE id IN ({})",
            in_placeholders(4, ids.len())
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
            Box::new(sha.to_string()),
            Box::new(commit_date.map(|d| d.to_string())),
            Box::new(last_sync.to_string()),
        ];
        values.extend(ids.iter().map(|id| Box::new(id.to_string()) as _));
        conn.execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))?;
        Ok(())
    })
}

/// Builds `?N, ?N+1, ...` placeholder lists for IN clauses.
fn in_placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
