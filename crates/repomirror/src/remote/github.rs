//! GitHub REST API implementation of [`RemoteGitClient`].
//!
//! Maps HTTP status codes to the error taxonomy at the response boundary;
//! nothing downstream looks at response text to classify a failure.

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

use super::types::{BranchRef, CommitInfo, MergeOutcome};
use super::RemoteGitClient;
use crate::config::MirrorConfig;
use crate::error::{Result, SyncError};

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub REST API client.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: secrecy::SecretString,
}

impl GitHubClient {
    /// Builds a client from startup configuration.
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .user_agent(concat!("repomirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Transient {
                operation: "client_init",
                message: e.to_string(),
                details: None,
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header("Accept", "application/vnd.github+json")
    }

    async fn send(&self, builder: RequestBuilder, operation: &'static str) -> Result<Response> {
        builder.send().await.map_err(|e| SyncError::Transient {
            operation,
            message: e.to_string(),
            details: None,
        })
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        &self,
        resp: Response,
        operation: &'static str,
    ) -> Result<T> {
        resp.json().await.map_err(|e| SyncError::Transient {
            operation,
            message: format!("unexpected response payload: {}", e),
            details: None,
        })
    }
}

/// Classifies a non-success provider response.
///
/// 404 is `RemoteNotFound` for every operation (it drives branch creation
/// during ensuring). Merge conflicts and rejected ref updates get their
/// own variants; everything else is transient.
async fn classify(resp: Response, operation: &'static str) -> SyncError {
    let status = resp.status();
    let details: Option<serde_json::Value> = resp.json().await.ok();
    let message = details
        .as_ref()
        .and_then(|d| d.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    match (operation, status) {
        (_, StatusCode::NOT_FOUND) => SyncError::RemoteNotFound { operation },
        ("merge_branch", StatusCode::CONFLICT) => SyncError::MergeConflict { message, details },
        ("force_update_branch", StatusCode::UNPROCESSABLE_ENTITY) => {
            SyncError::ForceUpdateFailure { message, details }
        }
        _ => SyncError::Transient {
            operation,
            message,
            details,
        },
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    sha: String,
}

#[async_trait::async_trait]
impl RemoteGitClient for GitHubClient {
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let operation = "default_branch";
        let path = format!("/repos/{}/{}", owner, repo);
        let resp = self.send(self.request(Method::GET, &path), operation).await?;
        if !resp.status().is_success() {
            return Err(classify(resp, operation).await);
        }
        let body: RepoResponse = self.parse(resp, operation).await?;
        Ok(body.default_branch)
    }

    async fn get_commit(&self, owner: &str, repo: &str, git_ref: &str) -> Result<CommitInfo> {
        let operation = "get_commit";
        let path = format!("/repos/{}/{}/commits/{}", owner, repo, git_ref);
        let resp = self.send(self.request(Method::GET, &path), operation).await?;
        if !resp.status().is_success() {
            return Err(classify(resp, operation).await);
        }
        let body: CommitResponse = self.parse(resp, operation).await?;
        Ok(CommitInfo {
            sha: body.sha,
            author_date: body.commit.author.and_then(|a| a.date),
        })
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchRef> {
        let operation = "get_branch";
        let path = format!("/repos/{}/{}/branches/{}", owner, repo, branch);
        let resp = self.send(self.request(Method::GET, &path), operation).await?;
        if !resp.status().is_success() {
            return Err(classify(resp, operation).await);
        }
        let body: BranchResponse = self.parse(resp, operation).await?;
        Ok(BranchRef {
            name: body.name,
            sha: body.commit.sha,
        })
    }

    async fn create_branch(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()> {
        let operation = "create_branch";
        let path = format!("/repos/{}/{}/git/refs", owner, repo);
        let body = serde_json::json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": sha,
        });
        let resp = self
            .send(self.request(Method::POST, &path).json(&body), operation)
            .await?;
        if !resp.status().is_success() {
            return Err(classify(resp, operation).await);
        }
        log::info!("Created branch {} at {} on {}/{}", branch, sha, owner, repo);
        Ok(())
    }

    async fn force_update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        let operation = "force_update_branch";
        let path = format!("/repos/{}/{}/git/refs/heads/{}", owner, repo, branch);
        let body = serde_json::json!({ "sha": sha, "force": true });
        let resp = self
            .send(self.request(Method::PATCH, &path).json(&body), operation)
            .await?;
        if !resp.status().is_success() {
            return Err(classify(resp, operation).await);
        }
        Ok(())
    }

    async fn merge_branch(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head_sha: &str,
        message: &str,
    ) -> Result<MergeOutcome> {
        let operation = "merge_branch";
        let path = format!("/repos/{}/{}/merges", owner, repo);
        let body = serde_json::json!({
            "base": base,
            "head": head_sha,
            "commit_message": message,
        });
        let resp = self
            .send(self.request(Method::POST, &path).json(&body), operation)
            .await?;

        // 204: base already contains the head commit; nothing to merge.
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(MergeOutcome {
                sha: head_sha.to_string(),
                fast_forwarded: true,
            });
        }
        if !resp.status().is_success() {
            return Err(classify(resp, operation).await);
        }
        let body: MergeResponse = self.parse(resp, operation).await?;
        Ok(MergeOutcome {
            sha: body.sha,
            fast_forwarded: false,
        })
    }
}
