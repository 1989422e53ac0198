//! Update decision.
//!
//! Rule precedence:
//! 1. `Forced` (`--force`)
//! 2. `VersionChanged` (release tag differs, including no stored tag)
//! 3. `FingerprintChanged` (selected asset date/name differs)
//! 4. `UpToDate`

use crate::state::{FieldChange, Fingerprint, StatePatch, SyncState};

/// Why a run should (or should not) install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Forced,
    VersionChanged {
        stored: Option<String>,
        latest: Option<String>,
    },
    FingerprintChanged(FieldChange),
    UpToDate,
}

impl Decision {
    pub fn should_update(&self) -> bool {
        !matches!(self, Decision::UpToDate)
    }
}

/// Compare the freshly built `patch` with the `stored` state.
pub fn should_update<F: Fingerprint>(
    patch: &StatePatch<F>,
    stored: &SyncState<F>,
    force: bool,
) -> Decision {
    if force {
        tracing::info!("force mode: updating unconditionally");
        return Decision::Forced;
    }

    if patch.version != stored.version {
        tracing::info!(
            stored = stored.version.as_deref().unwrap_or("none"),
            latest = patch.version.as_deref().unwrap_or("none"),
            "release version changed"
        );
        return Decision::VersionChanged {
            stored: stored.version.clone(),
            latest: patch.version.clone(),
        };
    }

    tracing::info!("release version unchanged, checking asset fingerprint");
    if let Some(change) = patch.fingerprint.changed_from(&stored.fingerprint) {
        tracing::info!(%change, "asset fingerprint changed");
        return Decision::FingerprintChanged(change);
    }

    tracing::info!("version and asset fingerprint match the installed copy");
    Decision::UpToDate
}
