//! Startup configuration for the provider client.
//!
//! Credentials are process-wide, resolved once at startup and treated as
//! opaque afterwards. The access token is resolved from the environment,
//! with a `*_FILE` indirection for Docker-secrets style deployments, and
//! wrapped in `SecretString` so it never appears in debug output.

use secrecy::SecretString;

use crate::error::{Result, SyncError};

/// Environment variable holding the provider access token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_ACCESS_TOKEN";

/// Environment variable pointing at a file containing the token.
pub const TOKEN_FILE_ENV_VAR: &str = "GITHUB_ACCESS_TOKEN_FILE";

/// Environment variable overriding the API base URL (e.g. GitHub
/// Enterprise deployments).
pub const API_URL_ENV_VAR: &str = "GITHUB_API_URL";

/// Default provider API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Provider configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct MirrorConfig {
    /// API base URL without a trailing slash.
    pub api_url: String,
    /// Provider access token.
    pub token: SecretString,
}

impl MirrorConfig {
    /// Builds a configuration from explicit values.
    pub fn new(api_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            api_url: api_url.into(),
            token,
        }
    }

    /// Resolves the configuration from the environment.
    ///
    /// Token sources in priority order: `GITHUB_ACCESS_TOKEN`, then the
    /// file named by `GITHUB_ACCESS_TOKEN_FILE`. A missing token fails
    /// with `AuthConfigurationError` before any operation runs.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            api_url,
            token: resolve_token()?,
        })
    }
}

fn resolve_token() -> Result<SecretString> {
    if let Ok(value) = std::env::var(TOKEN_ENV_VAR) {
        // Env vars may carry trailing newlines from shell exports.
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    if let Ok(path) = std::env::var(TOKEN_FILE_ENV_VAR) {
        if !path.trim().is_empty() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| SyncError::AuthConfiguration {
                    reason: format!("failed to read token file '{}': {}", path, e),
                })?;
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                return Ok(SecretString::from(trimmed.to_string()));
            }
            return Err(SyncError::AuthConfiguration {
                reason: format!("token file '{}' is empty", path),
            });
        }
    }

    Err(SyncError::AuthConfiguration {
        reason: format!(
            "neither {} nor {} is set",
            TOKEN_ENV_VAR, TOKEN_FILE_ENV_VAR
        ),
    })
}
