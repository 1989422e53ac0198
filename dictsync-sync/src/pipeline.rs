//! Synchronization driver.
//!
//! ```text
//! Fetching → Selecting → Deciding ─┬─► Skipped
//!                                  └─► Installing → Recording → Done
//! (any state) ─► Failed
//! ```
//!
//! The status file is loaded once up front and written at most once, in
//! `Recording`. Runs that stop before `Installing` leave it untouched.

use std::fmt;

use dictsync_core::{should_update, Decision, HistoryEntry, Outcome, StatePatch};

use crate::config::SyncConfig;
use crate::error::{InstallError, SyncError};
use crate::fetcher::ReleaseFetcher;
use crate::installer::{InstallContext, InstallReport, Installer};
use crate::profiles::Profile;
use crate::selector::AssetSelector;
use crate::status_store;
use crate::transport::Transport;

/// Driver states. `Done`, `Skipped` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Fetching,
    Selecting,
    Deciding,
    Installing,
    Recording,
    Done,
    Skipped,
    Failed,
}

impl SyncPhase {
    /// Terminal states map to process success except `Failed`.
    pub fn is_success(self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Skipped)
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncPhase::Fetching => "fetching",
            SyncPhase::Selecting => "selecting",
            SyncPhase::Deciding => "deciding",
            SyncPhase::Installing => "installing",
            SyncPhase::Recording => "recording",
            SyncPhase::Done => "done",
            SyncPhase::Skipped => "skipped",
            SyncPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Summary of a run that ended in `Done` or `Skipped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub profile: &'static str,
    pub phase: SyncPhase,
    pub version: String,
    pub asset: String,
    pub decision: Decision,
    /// Present when `phase` is `Done`.
    pub install: Option<InstallReport>,
}

fn enter(phase: SyncPhase, config: &SyncConfig) -> Result<(), SyncError> {
    tracing::debug!(%phase, "entering phase");
    if config.interrupt.is_set() {
        return Err(SyncError::Interrupted);
    }
    Ok(())
}

/// Run one synchronization of `profile` against its upstream.
pub fn run<S, I>(
    profile: &Profile<S, I>,
    transport: &dyn Transport,
    config: &SyncConfig,
) -> Result<SyncReport, SyncError>
where
    S: AssetSelector,
    I: Installer,
{
    let result = drive(profile, transport, config);
    if let Err(err) = &result {
        tracing::debug!(phase = %SyncPhase::Failed, error = %err, "run failed");
    }
    result
}

fn drive<S, I>(
    profile: &Profile<S, I>,
    transport: &dyn Transport,
    config: &SyncConfig,
) -> Result<SyncReport, SyncError>
where
    S: AssetSelector,
    I: Installer,
{
    tracing::info!(profile = profile.name(), repo = %profile.repo, "checking for updates");
    let mut state = status_store::load::<S::Fingerprint>(&profile.status_file);

    enter(SyncPhase::Fetching, config)?;
    let release = ReleaseFetcher::new(transport, config).fetch_latest(&profile.repo)?;

    enter(SyncPhase::Selecting, config)?;
    let selection =
        profile
            .selector
            .select(&release.assets)
            .ok_or_else(|| SyncError::SelectionNotFound {
                profile: profile.name(),
                version: release.version.clone(),
                asset_count: release.assets.len(),
            })?;
    let patch = StatePatch::new(release.version.clone(), selection.fingerprint.clone());

    enter(SyncPhase::Deciding, config)?;
    let decision = should_update(&patch, &state, config.force);
    if !decision.should_update() {
        tracing::info!(phase = %SyncPhase::Skipped, "already up to date, nothing to do");
        return Ok(SyncReport {
            profile: profile.name(),
            phase: SyncPhase::Skipped,
            version: release.version,
            asset: selection.asset.name,
            decision,
            install: None,
        });
    }

    enter(SyncPhase::Installing, config)?;
    let ctx = InstallContext {
        transport,
        interrupt: &config.interrupt,
    };
    let installed = profile.installer.install(&selection.asset, &ctx);
    if matches!(installed, Err(InstallError::Interrupted)) {
        return Err(SyncError::Interrupted);
    }

    tracing::debug!(phase = %SyncPhase::Recording, "entering phase");
    let outcome = if installed.is_ok() {
        state.apply(&patch);
        Outcome::Success
    } else {
        Outcome::Failure
    };
    let entry = HistoryEntry::now(outcome, &patch);
    state.record(&entry);
    tracing::info!(entry = %entry, "recorded update history");
    let saved = status_store::save(&profile.status_file, &state);

    match installed {
        Ok(report) => {
            saved?;
            tracing::info!(
                phase = %SyncPhase::Done,
                version = %release.version,
                path = %report.installed.display(),
                "update complete"
            );
            Ok(SyncReport {
                profile: profile.name(),
                phase: SyncPhase::Done,
                version: release.version,
                asset: selection.asset.name,
                decision,
                install: Some(report),
            })
        }
        Err(install_err) => {
            if let Err(save_err) = saved {
                tracing::error!(error = %save_err, "failed to persist status after install failure");
            }
            Err(install_err.into())
        }
    }
}
