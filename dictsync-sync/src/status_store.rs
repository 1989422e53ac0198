//! Status store: the JSON record of the last installed release.
//!
//! Loading is permissive: a missing file, a malformed file or a file of the
//! wrong shape all yield default state (logged at different levels) and
//! missing keys are backfilled. Saving rewrites the whole record with the
//! same atomic `.tmp` + rename pattern as the installers.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use dictsync_core::{Fingerprint, SyncState};

use crate::error::{io_err, SyncError};

/// Load the status file at `path`. Never fails.
pub fn load<F: Fingerprint>(path: &Path) -> SyncState<F> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no status file yet, starting fresh");
            return SyncState::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read status file, using defaults");
            return SyncState::default();
        }
    };

    let value: Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "status file is not valid JSON, using defaults");
            return SyncState::default();
        }
    };

    let Some(object) = value.as_object() else {
        tracing::warn!(path = %path.display(), "status file is not a JSON object, using defaults");
        return SyncState::default();
    };

    let missing = missing_keys::<F>(object);
    if !missing.is_empty() {
        tracing::info!(path = %path.display(), keys = ?missing, "backfilling missing status keys");
    }

    match serde_json::from_value(value) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "status file does not match the expected schema, using defaults");
            SyncState::default()
        }
    }
}

/// Keys a default `SyncState<F>` serializes that `object` lacks.
fn missing_keys<F: Fingerprint>(object: &serde_json::Map<String, Value>) -> Vec<String> {
    let known = match serde_json::to_value(SyncState::<F>::default()) {
        Ok(Value::Object(known)) => known,
        _ => return Vec::new(),
    };
    known
        .keys()
        .filter(|key| !object.contains_key(*key))
        .cloned()
        .collect()
}

/// Persist `state` to `path` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save<F: Fingerprint>(path: &Path, state: &SyncState<F>) -> Result<(), SyncError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!(path = %path.display(), "status file saved");
    Ok(())
}
