//! Asset selection policies.
//!
//! A selector picks the release asset to install and captures its
//! fingerprint. Not finding a match is a normal `None`, not an error; the
//! driver decides what that means for the run.

use regex::Regex;

use dictsync_core::{ArchiveFingerprint, AssetRef, DatedFingerprint, Fingerprint};

use crate::error::SyncError;

/// The asset chosen from a release, with the fingerprint derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<F> {
    pub asset: AssetRef,
    pub fingerprint: F,
}

/// Pluggable asset-selection policy.
pub trait AssetSelector {
    type Fingerprint: Fingerprint;

    fn select(&self, assets: &[AssetRef]) -> Option<Selection<Self::Fingerprint>>;
}

/// An 8-digit `YYYYMMDD` date captured from a file name.
#[derive(Debug, Clone)]
pub struct DatePattern(Regex);

impl DatePattern {
    /// `pattern` must contain exactly one capture group around the date.
    pub fn new(pattern: &str) -> Result<Self, SyncError> {
        Ok(Self(Regex::new(pattern)?))
    }

    /// `<prefix>(\d{8})<suffix>` with both ends matched literally.
    pub fn between(prefix: &str, suffix: &str) -> Result<Self, SyncError> {
        Self::new(&format!(
            r"{}(\d{{8}}){}",
            regex::escape(prefix),
            regex::escape(suffix)
        ))
    }

    pub fn extract(&self, name: &str) -> Option<String> {
        self.0
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

// ---------------------------------------------------------------------------
// Single-target policy
// ---------------------------------------------------------------------------

/// First asset ending with `suffix` and containing `target`; the date is the
/// `_YYYYMMDD.` group in its name.
#[derive(Debug, Clone)]
pub struct ArchiveSelector {
    target: String,
    suffix: String,
    date: DatePattern,
}

impl ArchiveSelector {
    pub fn new(target: impl Into<String>, suffix: impl Into<String>) -> Result<Self, SyncError> {
        Ok(Self {
            target: target.into(),
            suffix: suffix.into(),
            date: DatePattern::new(r"_(\d{8})\.")?,
        })
    }

    pub fn extract_date(&self, name: &str) -> Option<String> {
        self.date.extract(name)
    }
}

impl AssetSelector for ArchiveSelector {
    type Fingerprint = ArchiveFingerprint;

    fn select(&self, assets: &[AssetRef]) -> Option<Selection<ArchiveFingerprint>> {
        let asset = assets
            .iter()
            .find(|a| a.name.ends_with(&self.suffix) && a.name.contains(&self.target))?;
        let date = self.extract_date(&asset.name);
        tracing::info!(asset = %asset.name, date = ?date, "found release archive");
        Some(Selection {
            asset: asset.clone().with_date(date.clone()),
            fingerprint: ArchiveFingerprint { asset_date: date },
        })
    }
}

// ---------------------------------------------------------------------------
// Multi-dated policy
// ---------------------------------------------------------------------------

/// Newest `<prefix>YYYYMMDD<suffix>` asset. Ties on the date keep the first
/// asset in release order.
#[derive(Debug, Clone)]
pub struct DatedSelector {
    prefix: String,
    suffix: String,
    date: DatePattern,
}

impl DatedSelector {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Result<Self, SyncError> {
        let prefix = prefix.into();
        let suffix = suffix.into();
        let date = DatePattern::between(&prefix, &suffix)?;
        Ok(Self {
            prefix,
            suffix,
            date,
        })
    }

    pub fn extract_date(&self, name: &str) -> Option<String> {
        self.date.extract(name)
    }

    /// Matching assets paired with their dates, in release order.
    fn candidates<'a>(&self, assets: &'a [AssetRef]) -> Vec<(&'a AssetRef, String)> {
        assets
            .iter()
            .filter(|a| a.name.starts_with(&self.prefix) && a.name.ends_with(&self.suffix))
            .filter_map(|a| self.extract_date(&a.name).map(|date| (a, date)))
            .collect()
    }
}

impl AssetSelector for DatedSelector {
    type Fingerprint = DatedFingerprint;

    fn select(&self, assets: &[AssetRef]) -> Option<Selection<DatedFingerprint>> {
        let candidates = self.candidates(assets);
        // Zero-padded YYYYMMDD: string order is date order. Strict `>` keeps
        // the earliest of equal dates.
        let (asset, date) = candidates
            .iter()
            .fold(None::<&(&AssetRef, String)>, |best, candidate| match best {
                Some(b) if candidate.1 <= b.1 => Some(b),
                _ => Some(candidate),
            })?;

        tracing::info!(
            candidates = candidates.len(),
            asset = %asset.name,
            date = %date,
            "selected newest dated dictionary"
        );
        Some(Selection {
            asset: (*asset).clone().with_date(Some(date.clone())),
            fingerprint: DatedFingerprint {
                latest_dict_date: Some(date.clone()),
                latest_dict_name: Some(asset.name.clone()),
            },
        })
    }
}
