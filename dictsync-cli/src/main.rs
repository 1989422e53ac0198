//! dictsync: keep IME dictionaries in step with their upstream releases.
//!
//! # Usage
//!
//! ```text
//! dictsync custom-pinyin [--force] [--github-token <TOKEN>] [--root <DIR>]
//! dictsync zhwiki        [--force] [--github-token <TOKEN>] [--root <DIR>]
//! ```
//!
//! The token may also come from `GITHUB_TOKEN`; the flag wins when both are
//! set. Exit status is 0 when the dictionary was updated or already current,
//! 1 on any failure or interruption.

mod logging;
mod signals;
mod sync;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use dictsync_sync::config::DEFAULT_API_BASE;
use dictsync_sync::{Interrupt, ProfileKind};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dictsync",
    version,
    about = "Update a local dictionary from the latest GitHub release of its upstream",
    long_about = None,
)]
pub struct Cli {
    /// Dictionary to synchronize.
    #[arg(value_enum)]
    pub dictionary: DictionaryArg,

    /// Reinstall even when version and asset date are unchanged.
    #[arg(long)]
    pub force: bool,

    /// GitHub token; takes precedence over the GITHUB_TOKEN environment variable.
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Project root holding the `dict/` and `logs/` directories.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// GitHub API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Dictionary argument, parsed from CLI strings into a sync profile
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse a [`ProfileKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DictionaryArg {
    /// wuhgit/CustomPinyinDictionary → dict/CustomPinyinDictionary_Fcitx.dict
    CustomPinyin,
    /// felixonmars/fcitx5-pinyin-zhwiki → dict/zhwiki-YYYYMMDD.dict
    Zhwiki,
}

impl From<DictionaryArg> for ProfileKind {
    fn from(arg: DictionaryArg) -> Self {
        match arg {
            DictionaryArg::CustomPinyin => ProfileKind::CustomPinyin,
            DictionaryArg::Zhwiki => ProfileKind::Zhwiki,
        }
    }
}

impl fmt::Display for DictionaryArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ProfileKind::from(*self).fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let kind = ProfileKind::from(cli.dictionary);
    logging::init(&cli.log_level, &kind.log_file(&cli.root));

    let interrupt = Interrupt::default();
    if let Err(err) = signals::install(&interrupt) {
        tracing::warn!(error = %err, "could not install interrupt handler");
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| sync::run(&cli, interrupt)));
    match outcome {
        Ok(Ok(report)) if report.phase.is_success() => {
            tracing::info!(phase = %report.phase, "update run finished successfully");
            ExitCode::SUCCESS
        }
        Ok(Ok(report)) => {
            tracing::error!(phase = %report.phase, "update run ended without success");
            ExitCode::FAILURE
        }
        Ok(Err(err)) => {
            tracing::error!("update run failed: {err:#}");
            ExitCode::FAILURE
        }
        Err(_) => {
            tracing::error!("update run aborted by an unexpected internal error");
            ExitCode::FAILURE
        }
    }
}
