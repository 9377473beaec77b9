//! `themesmith diff`: show unified diffs for what reconciliation would overwrite.

use anyhow::{Context, Result};
use clap::Args;

use themesmith_core::ThemeConfig;
use themesmith_sync::{diff_reconcile, ReconcileScope};

use super::print_json;

/// Arguments for `themesmith diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Preview the partial scope instead of the full one.
    #[arg(long)]
    pub partial: bool,

    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let scope = if self.partial {
            ReconcileScope::Partial
        } else {
            ReconcileScope::Full
        };
        let report =
            diff_reconcile(&config.layout(), config, scope).context("reconcile preview failed")?;

        if self.json {
            return print_json(&report);
        }
        if report.diffs.is_empty() {
            println!("No differences.");
            return Ok(());
        }

        for diff in report.diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
