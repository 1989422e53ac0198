//! Installers: download, unpack, locate and atomically place dictionaries.
//!
//! ## Staging protocol
//!
//! 1. Create a scoped temporary directory (dropped on every exit path).
//! 2. Stream the asset into it in 8 KiB chunks.
//! 3. Extract `.tar.gz`/`.tgz` archives into `<tmp>/extracted`.
//! 4. Walk the staging area in sorted order and take the first payload match.
//!
//! Placement then copies the payload to `<target>.dictsync.tmp` (keeping
//! permissions and timestamps) and renames it over the target.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use flate2::read::GzDecoder;
use glob::Pattern;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use walkdir::WalkDir;

use dictsync_core::AssetRef;

use crate::config::Interrupt;
use crate::error::{InstallError, SyncError};
use crate::transport::Transport;

/// Download chunk size.
pub const CHUNK_SIZE: usize = 8192;

// ---------------------------------------------------------------------------
// Install result + strategy seam
// ---------------------------------------------------------------------------

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Final path of the installed dictionary.
    pub installed: PathBuf,
    /// Stale dated files removed before placement.
    pub removed: Vec<PathBuf>,
    /// SHA-256 hex digest of the installed file.
    pub sha256: String,
}

/// Network + interrupt handles an installer may use.
pub struct InstallContext<'a> {
    pub transport: &'a dyn Transport,
    pub interrupt: &'a Interrupt,
}

/// Pluggable install strategy.
pub trait Installer {
    fn install(&self, asset: &AssetRef, ctx: &InstallContext<'_>)
        -> Result<InstallReport, InstallError>;
}

// ---------------------------------------------------------------------------
// Staging helpers
// ---------------------------------------------------------------------------

fn download_err(url: &str, reason: impl ToString) -> InstallError {
    InstallError::Download {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

fn copy_err(path: &Path, source: io::Error) -> InstallError {
    InstallError::Copy {
        path: path.to_path_buf(),
        source,
    }
}

/// Stream `url` into `dest` chunk by chunk. Returns the byte count.
pub(crate) fn download_to(
    ctx: &InstallContext<'_>,
    url: &str,
    dest: &Path,
) -> Result<u64, InstallError> {
    tracing::info!(%url, "downloading asset");
    let mut reader = ctx.transport.open(url).map_err(|e| download_err(url, e))?;
    let mut file = File::create(dest).map_err(|e| download_err(url, e))?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        if ctx.interrupt.is_set() {
            return Err(InstallError::Interrupted);
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(download_err(url, e)),
        };
        file.write_all(&buf[..n]).map_err(|e| download_err(url, e))?;
        total += n as u64;
    }
    file.sync_all().map_err(|e| download_err(url, e))?;

    tracing::info!(path = %dest.display(), bytes = total, "download complete");
    Ok(total)
}

fn is_archive(name: &str) -> bool {
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Unpack a gzip-compressed tarball into `dest`.
pub(crate) fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let extract_err = |source| InstallError::Extract {
        archive: archive.to_path_buf(),
        source,
    };
    tracing::info!(archive = %archive.display(), "extracting archive");
    fs::create_dir_all(dest).map_err(extract_err)?;
    let file = File::open(archive).map_err(extract_err)?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .map_err(extract_err)?;
    tracing::info!(dest = %dest.display(), "extraction complete");
    Ok(())
}

/// First file under `root` whose name matches `pattern`, in sorted walk order.
pub(crate) fn locate(root: &Path, pattern: &Pattern) -> Result<PathBuf, InstallError> {
    let matches: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches(name))
        })
        .map(|entry| entry.into_path())
        .collect();

    let Some(first) = matches.first() else {
        return Err(InstallError::Locate {
            pattern: pattern.as_str().to_string(),
            searched: root.to_path_buf(),
        });
    };

    tracing::info!(count = matches.len(), "located payload candidates");
    for path in &matches {
        tracing::info!(path = %path.display(), "  candidate");
    }
    Ok(first.clone())
}

/// Download `asset` into a fresh staging directory and locate the payload.
///
/// The returned [`TempDir`] must outlive any use of the payload path.
pub(crate) fn stage(
    asset: &AssetRef,
    payload: &Pattern,
    ctx: &InstallContext<'_>,
) -> Result<(TempDir, PathBuf), InstallError> {
    let url = asset.download_url.as_str();
    let staging = tempfile::Builder::new()
        .prefix("dictsync-")
        .tempdir()
        .map_err(|e| download_err(url, format!("cannot create staging directory: {e}")))?;

    let file_name = Path::new(&asset.name)
        .file_name()
        .ok_or_else(|| download_err(url, format!("unusable asset name '{}'", asset.name)))?;
    let downloaded = staging.path().join(file_name);
    download_to(ctx, url, &downloaded)?;

    let search_root = if is_archive(&asset.name) {
        let extracted = staging.path().join("extracted");
        extract_tar_gz(&downloaded, &extracted)?;
        extracted
    } else {
        staging.path().to_path_buf()
    };

    let found = locate(&search_root, payload)?;
    Ok((staging, found))
}

// ---------------------------------------------------------------------------
// Placement helpers
// ---------------------------------------------------------------------------

/// Copy `src` over `dest` via a sibling `.dictsync.tmp` file and rename,
/// preserving permissions and access/modification times.
pub(crate) fn place_file(src: &Path, dest: &Path) -> Result<(), InstallError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| copy_err(parent, e))?;
    }

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dictionary".to_string());
    let tmp = dest.with_file_name(format!("{name}.dictsync.tmp"));

    let result = (|| {
        fs::copy(src, &tmp)?;
        let meta = fs::metadata(src)?;
        filetime::set_file_times(
            &tmp,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        )?;
        fs::rename(&tmp, dest)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(copy_err(dest, e));
    }
    tracing::info!(from = %src.display(), to = %dest.display(), "installed dictionary");
    Ok(())
}

/// Streaming SHA-256 of a file, hex encoded.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn finish(installed: PathBuf, removed: Vec<PathBuf>) -> Result<InstallReport, InstallError> {
    let sha256 = sha256_file(&installed).map_err(|e| copy_err(&installed, e))?;
    tracing::info!(path = %installed.display(), %sha256, "installed file digest");
    Ok(InstallReport {
        installed,
        removed,
        sha256,
    })
}

// ---------------------------------------------------------------------------
// Single-file installer
// ---------------------------------------------------------------------------

/// Replaces one fixed-path dictionary with the payload found in the asset.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    target: PathBuf,
    payload: Pattern,
}

impl ArchiveInstaller {
    /// `payload` is a glob over file names, e.g. `*CustomPinyinDictionary_Fcitx*.dict`.
    pub fn new(target: impl Into<PathBuf>, payload: &str) -> Result<Self, SyncError> {
        Ok(Self {
            target: target.into(),
            payload: Pattern::new(payload)?,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Installer for ArchiveInstaller {
    fn install(
        &self,
        asset: &AssetRef,
        ctx: &InstallContext<'_>,
    ) -> Result<InstallReport, InstallError> {
        let (_staging, payload) = stage(asset, &self.payload, ctx)?;
        if ctx.interrupt.is_set() {
            return Err(InstallError::Interrupted);
        }
        place_file(&payload, &self.target)?;
        finish(self.target.clone(), Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Dated multi-file installer
// ---------------------------------------------------------------------------

/// Keeps exactly one `<prefix>YYYYMMDD<suffix>` file in a directory.
#[derive(Debug, Clone)]
pub struct DatedInstaller {
    target_dir: PathBuf,
    dated: Pattern,
}

impl DatedInstaller {
    /// `dated` is a glob over file names, e.g. `zhwiki-*.dict`.
    pub fn new(target_dir: impl Into<PathBuf>, dated: &str) -> Result<Self, SyncError> {
        Ok(Self {
            target_dir: target_dir.into(),
            dated: Pattern::new(dated)?,
        })
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Delete every dated file in the target directory. Failures are logged
    /// and skipped.
    pub fn remove_stale(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.target_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!(dir = %self.target_dir.display(), error = %e, "cannot list dictionary directory");
                return Vec::new();
            }
        };

        let mut stale: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| self.dated.matches(name))
            })
            .map(|entry| entry.path())
            .collect();
        stale.sort();
        remove_each(stale)
    }
}

/// Delete `paths` one by one, returning those actually removed. A failed
/// deletion is logged and does not stop the rest.
fn remove_each(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for path in paths {
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed old dictionary file");
                removed.push(path);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to remove old dictionary file");
            }
        }
    }
    removed
}

impl Installer for DatedInstaller {
    fn install(
        &self,
        asset: &AssetRef,
        ctx: &InstallContext<'_>,
    ) -> Result<InstallReport, InstallError> {
        let (_staging, payload) = stage(asset, &self.dated, ctx)?;
        if ctx.interrupt.is_set() {
            return Err(InstallError::Interrupted);
        }

        fs::create_dir_all(&self.target_dir).map_err(|e| copy_err(&self.target_dir, e))?;
        let removed = self.remove_stale();
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "removed old dictionary files");
        }

        let file_name = Path::new(&asset.name)
            .file_name()
            .ok_or_else(|| copy_err(&self.target_dir, io::Error::other("unusable asset name")))?;
        let dest = self.target_dir.join(file_name);
        place_file(&payload, &dest)?;
        finish(dest, removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
