//! Persisted synchronization state.
//!
//! [`SyncState`] is what the status file holds. A run never edits it field by
//! field: it builds a sparse [`StatePatch`] from the fetched release and, only
//! once an install has succeeded, merges that patch with [`SyncState::apply`].
//!
//! The shape of the asset fingerprint depends on the dictionary variant and is
//! expressed through the [`Fingerprint`] trait, so both variants share one
//! state type and one merge rule.

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Maximum number of history lines kept in the status file.
pub const MAX_HISTORY_RECORDS: usize = 50;

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

/// A field whose stored value differs from the freshly fetched one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub stored: Option<String>,
    pub latest: Option<String>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.field,
            self.stored.as_deref().unwrap_or("none"),
            self.latest.as_deref().unwrap_or("none")
        )
    }
}

/// Secondary change-detection data captured from the selected asset.
///
/// Every field is optional. The same type doubles as the sparse patch shape:
/// `None` in a patch means "leave the stored value alone".
pub trait Fingerprint:
    fmt::Debug + Clone + Default + PartialEq + Serialize + DeserializeOwned
{
    /// Overwrite the fields of `self` that are present in `patch`.
    fn merge_from(&mut self, patch: &Self);

    /// The first field where `self` (latest) differs from `stored`.
    fn changed_from(&self, stored: &Self) -> Option<FieldChange>;

    /// Installed-asset detail appended to a history line.
    fn history_detail(&self) -> String;
}

fn merge_field(slot: &mut Option<String>, patch: &Option<String>) {
    if let Some(value) = patch {
        *slot = Some(value.clone());
    }
}

fn compare_field(
    field: &'static str,
    latest: &Option<String>,
    stored: &Option<String>,
) -> Option<FieldChange> {
    (latest != stored).then(|| FieldChange {
        field,
        stored: stored.clone(),
        latest: latest.clone(),
    })
}

/// Fingerprint of a single merged dictionary shipped inside an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveFingerprint {
    pub asset_date: Option<String>,
}

impl Fingerprint for ArchiveFingerprint {
    fn merge_from(&mut self, patch: &Self) {
        merge_field(&mut self.asset_date, &patch.asset_date);
    }

    fn changed_from(&self, stored: &Self) -> Option<FieldChange> {
        compare_field("asset_date", &self.asset_date, &stored.asset_date)
    }

    fn history_detail(&self) -> String {
        match &self.asset_date {
            Some(date) => format!(" (asset date: {})", display_date(date)),
            None => String::new(),
        }
    }
}

/// Fingerprint of the newest dated dictionary file in a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatedFingerprint {
    pub latest_dict_date: Option<String>,
    pub latest_dict_name: Option<String>,
}

impl Fingerprint for DatedFingerprint {
    fn merge_from(&mut self, patch: &Self) {
        merge_field(&mut self.latest_dict_date, &patch.latest_dict_date);
        merge_field(&mut self.latest_dict_name, &patch.latest_dict_name);
    }

    fn changed_from(&self, stored: &Self) -> Option<FieldChange> {
        compare_field(
            "latest_dict_date",
            &self.latest_dict_date,
            &stored.latest_dict_date,
        )
        .or_else(|| {
            compare_field(
                "latest_dict_name",
                &self.latest_dict_name,
                &stored.latest_dict_name,
            )
        })
    }

    fn history_detail(&self) -> String {
        format!(
            ", dictionary file: {}",
            self.latest_dict_name.as_deref().unwrap_or("unknown")
        )
    }
}

/// `20250101` → `2025-01-01`; anything unparseable is shown verbatim.
fn display_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

// ---------------------------------------------------------------------------
// State + patch
// ---------------------------------------------------------------------------

/// Contents of the status file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState<F> {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub fingerprint: F,
    #[serde(default)]
    pub update_history: Vec<String>,
    /// Keys this version does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Sparse update built during a run; new values win when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch<F> {
    pub version: Option<String>,
    pub fingerprint: F,
}

impl<F: Fingerprint> StatePatch<F> {
    pub fn new(version: impl Into<String>, fingerprint: F) -> Self {
        Self {
            version: Some(version.into()),
            fingerprint,
        }
    }
}

impl<F: Fingerprint> SyncState<F> {
    /// Merge `patch` into this state. History is left untouched.
    pub fn apply(&mut self, patch: &StatePatch<F>) {
        merge_field(&mut self.version, &patch.version);
        self.fingerprint.merge_from(&patch.fingerprint);
    }

    /// Append a history line, evicting the oldest lines beyond the cap.
    pub fn record(&mut self, entry: &HistoryEntry) {
        self.update_history.push(entry.to_string());
        if self.update_history.len() > MAX_HISTORY_RECORDS {
            let excess = self.update_history.len() - MAX_HISTORY_RECORDS;
            self.update_history.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Whether a recorded install attempt succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One line of `update_history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub at: NaiveDateTime,
    pub outcome: Outcome,
    pub version: Option<String>,
    pub detail: String,
}

impl HistoryEntry {
    /// Entry stamped with the current local time.
    pub fn now<F: Fingerprint>(outcome: Outcome, patch: &StatePatch<F>) -> Self {
        Self::at(Local::now().naive_local(), outcome, patch)
    }

    pub fn at<F: Fingerprint>(at: NaiveDateTime, outcome: Outcome, patch: &StatePatch<F>) -> Self {
        Self {
            at,
            outcome,
            version: patch.version.clone(),
            detail: patch.fingerprint.history_detail(),
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self.version.as_deref().unwrap_or("unknown");
        let ts = self.at.format("%Y-%m-%d %H:%M:%S");
        match self.outcome {
            Outcome::Success => write!(
                f,
                "{ts}: ✅ success - updated to version `{version}`{}",
                self.detail
            ),
            Outcome::Failure => write!(
                f,
                "{ts}: ❌ failure - attempted update to version `{version}`{}",
                self.detail
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
