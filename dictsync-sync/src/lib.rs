//! # dictsync-sync
//!
//! Release synchronization engine.
//!
//! Call [`pipeline::run`] with a [`profiles::Profile`], a
//! [`transport::Transport`] and a [`config::SyncConfig`] to fetch the latest
//! upstream release, decide whether it is new, install it and record the
//! outcome in the status file.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod pipeline;
pub mod profiles;
pub mod selector;
pub mod status_store;
pub mod transport;

pub use config::{Interrupt, RetryPolicy, SyncConfig};
pub use error::{FetchError, InstallError, SyncError, TransportError};
pub use installer::{InstallReport, Installer};
pub use pipeline::{run, SyncPhase, SyncReport};
pub use profiles::{Profile, ProfileKind};
pub use selector::{AssetSelector, Selection};
pub use transport::{Transport, UreqTransport};
