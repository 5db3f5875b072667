//! Repository identity resolution.
//!
//! Turns an opaque repository id into its stored record plus the
//! `{owner, repo}` pair extracted from the record's URL. Fails fast with
//! `InvalidUrlFormat` before any remote call when the URL does not
//! decompose.

use std::sync::OnceLock;

use regex::Regex;

use crate::db::{repo_store, Database, RepositoryRecord};
use crate::error::{Result, SyncError};

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Fixed pattern: `[scheme://]host/owner/repo[.git][/]`.
fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:https?://)?[^/\s]+/([^/\s]+)/([^/.\s]+)(?:\.git)?/?$")
            .expect("URL pattern is valid")
    })
}

/// Extracts `(owner, repo)` from a repository URL.
pub fn parse_owner_repo(url: &str) -> Result<(String, String)> {
    let caps = url_pattern()
        .captures(url.trim())
        .ok_or_else(|| SyncError::InvalidUrlFormat {
            url: url.to_string(),
        })?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// A record together with the owner/repo pair parsed from its URL.
#[derive(Debug, Clone)]
pub struct ResolvedRepository {
    pub record: RepositoryRecord,
    pub owner: String,
    pub repo: String,
}

/// Resolves repository ids against the record store.
pub struct RepositoryRegistry {
    db: Database,
}

impl RepositoryRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Looks up a record and decomposes its URL. Side-effect-free beyond
    /// the read.
    pub fn resolve(&self, id: &str) -> Result<ResolvedRepository> {
        let record = repo_store::find_by_id(&self.db, id)?.ok_or_else(|| SyncError::NotFound {
            id: id.to_string(),
        })?;
        let (owner, repo) = parse_owner_repo(&record.url)?;
        Ok(ResolvedRepository {
            record,
            owner,
            repo,
        })
    }
}
