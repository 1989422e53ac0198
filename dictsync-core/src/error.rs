//! Error types for dictsync-core.

use thiserror::Error;

/// Configuration problems detected before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `--github-token` nor `GITHUB_TOKEN` was provided.
    #[error("a GitHub token is required; set GITHUB_TOKEN or pass --github-token")]
    MissingToken,

    /// A token was provided but is empty after trimming whitespace.
    #[error("the GitHub token must not be empty")]
    EmptyToken,

    /// Repository identifier is not of the form `owner/name`.
    #[error("invalid repository '{0}'; expected owner/name")]
    InvalidRepo(String),
}

/// Resolve the bearer token with precedence flag > environment.
///
/// The chosen value is trimmed; an all-whitespace value is rejected rather
/// than falling through to the next source.
pub fn resolve_token(flag: Option<&str>, env: Option<&str>) -> Result<String, ConfigError> {
    let raw = match (flag, env) {
        (Some(token), _) => {
            tracing::debug!("using GitHub token from --github-token");
            token
        }
        (None, Some(token)) => {
            tracing::debug!("using GitHub token from GITHUB_TOKEN");
            token
        }
        (None, None) => return Err(ConfigError::MissingToken),
    };

    let token = raw.trim();
    if token.is_empty() {
        return Err(ConfigError::EmptyToken);
    }
    Ok(token.to_string())
}
