//! # dictsync-core
//!
//! Domain types for dictionary release synchronization: release descriptors,
//! the persisted [`state::SyncState`] with its typed patch/merge rule, history
//! entries, and the pure [`decide::should_update`] decision.

pub mod decide;
pub mod error;
pub mod state;
pub mod types;

pub use decide::{should_update, Decision};
pub use error::{resolve_token, ConfigError};
pub use state::{
    ArchiveFingerprint, DatedFingerprint, FieldChange, Fingerprint, HistoryEntry, Outcome,
    StatePatch, SyncState, MAX_HISTORY_RECORDS,
};
pub use types::{AssetRef, ReleaseDescriptor, RepoId};
