//! Error types for dictsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use dictsync_core::ConfigError;

/// Failure reported by a [`crate::transport::Transport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}")]
    Status {
        status: u16,
        rate_limit: RateLimitHints,
    },

    /// Timeout, DNS, TLS, connection reset and friends.
    #[error("network error: {0}")]
    Network(String),
}

/// `X-RateLimit-*` response headers, when the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitHints {
    pub remaining: Option<String>,
    pub reset: Option<String>,
}

/// Why the latest release could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Rate limiting or network faults persisted through every attempt.
    #[error("gave up after {attempts} attempts: {reason}")]
    Transient { attempts: u32, reason: String },

    /// A status that retrying cannot fix (404, 422, 500, ...).
    #[error("release API returned HTTP {status}")]
    Permanent { status: u16 },

    /// 2xx response whose body is not a release document.
    #[error("invalid release document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("interrupted while fetching release information")]
    Interrupted,
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }
}

/// Install sub-step failures. None of them leaves the status file touched
/// beyond a failure entry in its history.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("failed to extract {archive}: {source}")]
    Extract {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no file matching '{pattern}' found under {searched}")]
    Locate { pattern: String, searched: PathBuf },

    #[error("failed to install {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("interrupted during install")]
    Interrupted,
}

/// All errors that can end a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not fetch latest release: {0}")]
    Fetch(#[from] FetchError),

    #[error("release {version} has no asset matching the {profile} profile ({asset_count} assets)")]
    SelectionNotFound {
        profile: &'static str,
        version: String,
        asset_count: usize,
    },

    #[error("install failed: {0}")]
    Install(#[from] InstallError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (status file).
    #[error("status file JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid file name pattern: {0}")]
    Pattern(String),

    #[error("interrupted")]
    Interrupted,
}

impl SyncError {
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            SyncError::Interrupted
                | SyncError::Fetch(FetchError::Interrupted)
                | SyncError::Install(InstallError::Interrupted)
        )
    }
}

impl From<regex::Error> for SyncError {
    fn from(e: regex::Error) -> Self {
        SyncError::Pattern(e.to_string())
    }
}

impl From<glob::PatternError> for SyncError {
    fn from(e: glob::PatternError) -> Self {
        SyncError::Pattern(e.to_string())
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
