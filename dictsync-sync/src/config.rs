//! Run configuration, built once at process start and passed down.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const GITHUB_API_ACCEPT: &str = "application/vnd.github.v3+json";

/// Bounded retry settings for the release API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Applied to every request, including asset downloads.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Wait after a rate-limited attempt `attempt` (1-indexed): `base * attempt`.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Wait after a network failure; constant.
    pub fn network_delay(&self) -> Duration {
        self.base_delay
    }
}

/// Process-level interrupt flag shared with the signal handler.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    const POLL: Duration = Duration::from_millis(100);

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on interrupt.
    ///
    /// Returns `false` if the interrupt fired.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_set() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(Self::POLL.min(deadline - now));
        }
    }
}

/// Everything a run needs besides the profile itself.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory holding `dict/` and `logs/`.
    pub root: PathBuf,
    pub api_base: String,
    pub token: String,
    pub force: bool,
    pub retry: RetryPolicy,
    pub interrupt: Interrupt,
}

impl SyncConfig {
    pub fn new(root: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            force: false,
            retry: RetryPolicy::default(),
            interrupt: Interrupt::default(),
        }
    }
}
