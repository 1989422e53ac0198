//! Built-in dictionary profiles.
//!
//! A [`Profile`] bundles everything the generic driver needs to know about
//! one upstream: the repository, how to pick its asset, how to install it,
//! and where its status and log files live under the project root.

use std::fmt;
use std::path::{Path, PathBuf};

use dictsync_core::RepoId;

use crate::error::SyncError;
use crate::installer::{ArchiveInstaller, DatedInstaller, Installer};
use crate::selector::{ArchiveSelector, AssetSelector, DatedSelector};

pub const DICT_DIR: &str = "dict";
pub const LOGS_DIR: &str = "logs";

/// One upstream dictionary and its install strategy.
#[derive(Debug, Clone)]
pub struct Profile<S, I> {
    pub kind: ProfileKind,
    pub repo: RepoId,
    pub user_agent: &'static str,
    pub status_file: PathBuf,
    pub selector: S,
    pub installer: I,
}

impl<S: AssetSelector, I: Installer> Profile<S, I> {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// The dictionaries this tool knows how to maintain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// `wuhgit/CustomPinyinDictionary`: one merged file from a tarball.
    CustomPinyin,
    /// `felixonmars/fcitx5-pinyin-zhwiki`: one dated plain file.
    Zhwiki,
}

impl ProfileKind {
    pub fn name(self) -> &'static str {
        match self {
            ProfileKind::CustomPinyin => "custom-pinyin",
            ProfileKind::Zhwiki => "zhwiki",
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            ProfileKind::CustomPinyin => "custom_pinyin",
            ProfileKind::Zhwiki => "zhwiki",
        }
    }

    /// `<root>/logs/<stem>_status.json`
    pub fn status_file(self, root: &Path) -> PathBuf {
        root.join(LOGS_DIR)
            .join(format!("{}_status.json", self.file_stem()))
    }

    /// `<root>/logs/<stem>_update.log`
    pub fn log_file(self, root: &Path) -> PathBuf {
        root.join(LOGS_DIR)
            .join(format!("{}_update.log", self.file_stem()))
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// custom-pinyin
// ---------------------------------------------------------------------------

pub const CUSTOM_PINYIN_REPO: &str = "wuhgit/CustomPinyinDictionary";
pub const CUSTOM_PINYIN_TARGET: &str = "CustomPinyinDictionary_Fcitx";

/// `<root>/dict/CustomPinyinDictionary_Fcitx.dict` from the release tarball.
pub fn custom_pinyin(root: &Path) -> Result<Profile<ArchiveSelector, ArchiveInstaller>, SyncError> {
    let kind = ProfileKind::CustomPinyin;
    Ok(Profile {
        kind,
        repo: CUSTOM_PINYIN_REPO.parse()?,
        user_agent: "CustomPinyinUpdater/1.0",
        status_file: kind.status_file(root),
        selector: ArchiveSelector::new(CUSTOM_PINYIN_TARGET, ".tar.gz")?,
        installer: ArchiveInstaller::new(
            root.join(DICT_DIR)
                .join(format!("{CUSTOM_PINYIN_TARGET}.dict")),
            &format!("*{CUSTOM_PINYIN_TARGET}*.dict"),
        )?,
    })
}

// ---------------------------------------------------------------------------
// zhwiki
// ---------------------------------------------------------------------------

pub const ZHWIKI_REPO: &str = "felixonmars/fcitx5-pinyin-zhwiki";
pub const ZHWIKI_PREFIX: &str = "zhwiki-";
pub const ZHWIKI_SUFFIX: &str = ".dict";

/// `<root>/dict/zhwiki-YYYYMMDD.dict`, newest dated asset only.
pub fn zhwiki(root: &Path) -> Result<Profile<DatedSelector, DatedInstaller>, SyncError> {
    let kind = ProfileKind::Zhwiki;
    Ok(Profile {
        kind,
        repo: ZHWIKI_REPO.parse()?,
        user_agent: "ZhwikiUpdater/1.0",
        status_file: kind.status_file(root),
        selector: DatedSelector::new(ZHWIKI_PREFIX, ZHWIKI_SUFFIX)?,
        installer: DatedInstaller::new(
            root.join(DICT_DIR),
            &format!("{ZHWIKI_PREFIX}*{ZHWIKI_SUFFIX}"),
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_root() {
        let root = Path::new("/srv/ime");
        let pinyin = custom_pinyin(root).unwrap();
        assert_eq!(pinyin.repo.owner, "wuhgit");
        assert_eq!(pinyin.repo.name, "CustomPinyinDictionary");
        assert_eq!(
            pinyin.status_file,
            PathBuf::from("/srv/ime/logs/custom_pinyin_status.json")
        );
        assert_eq!(
            pinyin.installer.target(),
            Path::new("/srv/ime/dict/CustomPinyinDictionary_Fcitx.dict")
        );
        assert_eq!(
            ProfileKind::Zhwiki.log_file(root),
            PathBuf::from("/srv/ime/logs/zhwiki_update.log")
        );

        let wiki = zhwiki(root).unwrap();
        assert_eq!(wiki.installer.target_dir(), Path::new("/srv/ime/dict"));
        assert_eq!(wiki.repo.to_string(), "felixonmars/fcitx5-pinyin-zhwiki");
        assert_eq!(wiki.name(), "zhwiki");
    }
}
