//! `themesmith download`, `themesmith sync` and `themesmith upload`.
//!
//! The theme CLI's own output is logged as it is captured; a failed run
//! makes the command exit non-zero after the report is printed.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use themesmith_core::ThemeConfig;
use themesmith_sync::{deploy, fetch_full, fetch_partial, FetchReport, RemoteOutcome};

use super::print_json;

/// Arguments for `themesmith download`.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Download everything, bypassing the ignore file.
    #[arg(short = 'a', long)]
    pub all: bool,

    #[arg(long)]
    pub json: bool,
}

impl DownloadArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let report =
            fetch_full(&config.layout(), config, self.all).context("full download failed")?;
        finish_fetch(&report, self.json)
    }
}

/// Arguments for `themesmith sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let report = fetch_partial(&config.layout(), config).context("partial download failed")?;
        finish_fetch(&report, self.json)
    }
}

/// Arguments for `themesmith upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(long)]
    pub json: bool,
}

impl UploadArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let outcome = deploy(&config.layout(), config).context("upload failed")?;
        if self.json {
            print_json(&outcome)?;
        } else {
            print_outcome(&outcome);
        }
        check(&outcome)
    }
}

fn finish_fetch(report: &FetchReport, json: bool) -> Result<()> {
    if json {
        print_json(report)?;
    } else {
        println!("staged {} file(s) from dist/ into download/", report.staged);
        print_outcome(&report.remote);
    }
    check(&report.remote)
}

fn print_outcome(outcome: &RemoteOutcome) {
    let code = match outcome.exit_code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    };
    if outcome.success() {
        println!("{} {} (code {code})", "✓".green(), outcome.command);
    } else {
        println!("{} {} (code {code})", "✗".red(), outcome.command);
    }
}

fn check(outcome: &RemoteOutcome) -> Result<()> {
    if outcome.success() {
        return Ok(());
    }
    match outcome.exit_code {
        Some(code) => bail!("theme CLI exited with code {code}"),
        None => bail!("theme CLI did not run: {}", outcome.stderr.trim()),
    }
}
