//! Release fetcher: bounded, rate-limit-aware polling of the
//! `releases/latest` endpoint.
//!
//! Retry rules:
//! - HTTP 403 is treated as rate limiting; wait `base_delay * attempt`.
//! - Network faults wait a constant `base_delay`.
//! - Any other HTTP status fails immediately.
//! - No wait follows the final attempt.

use serde::Deserialize;

use dictsync_core::{AssetRef, ReleaseDescriptor, RepoId};

use crate::config::{SyncConfig, GITHUB_API_ACCEPT};
use crate::error::{FetchError, TransportError};
use crate::transport::Transport;

#[derive(Debug, Deserialize)]
struct ReleaseJson {
    tag_name: String,
    #[serde(default)]
    assets: Vec<AssetJson>,
}

#[derive(Debug, Deserialize)]
struct AssetJson {
    name: String,
    browser_download_url: String,
}

impl From<ReleaseJson> for ReleaseDescriptor {
    fn from(release: ReleaseJson) -> Self {
        ReleaseDescriptor {
            version: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| AssetRef::new(a.name, a.browser_download_url))
                .collect(),
        }
    }
}

/// Parse a release API response body.
pub fn parse_release(body: &str) -> Result<ReleaseDescriptor, FetchError> {
    let release: ReleaseJson = serde_json::from_str(body)?;
    Ok(release.into())
}

/// Queries the latest release of one repository.
pub struct ReleaseFetcher<'a> {
    transport: &'a dyn Transport,
    config: &'a SyncConfig,
}

impl<'a> ReleaseFetcher<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a SyncConfig) -> Self {
        Self { transport, config }
    }

    pub fn fetch_latest(&self, repo: &RepoId) -> Result<ReleaseDescriptor, FetchError> {
        let url = repo.latest_release_url(&self.config.api_base);
        let authorization = format!("Bearer {}", self.config.token);
        let headers = [
            ("Accept", GITHUB_API_ACCEPT),
            ("Authorization", authorization.as_str()),
        ];

        let policy = &self.config.retry;
        let interrupt = &self.config.interrupt;
        let max = policy.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=max {
            if interrupt.is_set() {
                return Err(FetchError::Interrupted);
            }
            tracing::info!(%repo, attempt, max_attempts = max, "requesting latest release");

            let delay = match self.transport.get_text(&url, &headers) {
                Ok(body) => {
                    let release = parse_release(&body)?;
                    tracing::info!(
                        version = %release.version,
                        assets = release.assets.len(),
                        "fetched latest release"
                    );
                    return Ok(release);
                }
                Err(TransportError::Status {
                    status: 403,
                    rate_limit,
                }) => {
                    tracing::warn!(
                        attempt,
                        remaining = rate_limit.remaining.as_deref().unwrap_or("unknown"),
                        reset = rate_limit.reset.as_deref().unwrap_or("unknown"),
                        "GitHub API rate limit hit"
                    );
                    last_reason = "rate limited (HTTP 403)".to_string();
                    policy.rate_limit_delay(attempt)
                }
                Err(TransportError::Status { status, .. }) => {
                    tracing::error!(attempt, status, "release API returned a non-retryable status");
                    return Err(FetchError::Permanent { status });
                }
                Err(TransportError::Network(reason)) => {
                    tracing::error!(attempt, error = %reason, "failed to fetch release information");
                    last_reason = reason;
                    policy.network_delay()
                }
            };

            if attempt < max {
                tracing::info!(seconds = delay.as_secs_f64(), "waiting before retry");
                if !interrupt.sleep(delay) {
                    return Err(FetchError::Interrupted);
                }
            }
        }

        Err(FetchError::Transient {
            attempts: max,
            reason: last_reason,
        })
    }
}
