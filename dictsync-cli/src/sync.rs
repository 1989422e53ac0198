//! One synchronization run for the selected dictionary.

use anyhow::{Context, Result};
use colored::Colorize;

use dictsync_core::resolve_token;
use dictsync_sync::{
    pipeline, profiles, AssetSelector, Installer, Interrupt, Profile, ProfileKind, SyncConfig,
    SyncError, SyncPhase, SyncReport, UreqTransport,
};

use crate::Cli;

const TOKEN_ENV: &str = "GITHUB_TOKEN";

pub fn run(cli: &Cli, interrupt: Interrupt) -> Result<SyncReport> {
    let env_token = std::env::var(TOKEN_ENV).ok();
    let token = resolve_token(cli.github_token.as_deref(), env_token.as_deref())
        .map_err(SyncError::from)?;

    let config = SyncConfig {
        force: cli.force,
        api_base: cli.api_base.clone(),
        interrupt,
        ..SyncConfig::new(&cli.root, token)
    };

    let report = match ProfileKind::from(cli.dictionary) {
        ProfileKind::CustomPinyin => execute(profiles::custom_pinyin(&config.root)?, &config),
        ProfileKind::Zhwiki => execute(profiles::zhwiki(&config.root)?, &config),
    };

    match report {
        Ok(report) => {
            print_report(&report);
            Ok(report)
        }
        Err(err) if err.is_interrupted() => {
            tracing::warn!("cancelled by user");
            Err(err).context("interrupted")
        }
        Err(SyncError::Fetch(err)) if err.is_transient() => {
            tracing::warn!("GitHub is rate limiting or unreachable; the next run will try again");
            Err(SyncError::Fetch(err)).with_context(|| format!("{} update failed", cli.dictionary))
        }
        Err(err) => Err(err).with_context(|| format!("{} update failed", cli.dictionary)),
    }
}

fn execute<S, I>(
    profile: Profile<S, I>,
    config: &SyncConfig,
) -> Result<SyncReport, SyncError>
where
    S: AssetSelector,
    I: Installer,
{
    let transport = UreqTransport::new(profile.user_agent, config.retry.request_timeout);
    pipeline::run(&profile, &transport, config)
}

fn print_report(report: &SyncReport) {
    match report.phase {
        SyncPhase::Skipped => println!(
            "{} '{}' already at {} ({}), nothing to do",
            "✓".green(),
            report.profile,
            report.version,
            report.asset
        ),
        _ => {
            println!(
                "{} '{}' updated to {} ({})",
                "✓".green(),
                report.profile,
                report.version.bold(),
                report.asset
            );
            if let Some(install) = &report.install {
                println!("  ✎  {}", install.installed.display());
                for removed in &install.removed {
                    println!("  ✗  {}", removed.display());
                }
                println!("  sha256 {}", install.sha256.dimmed());
            }
        }
    }
}
