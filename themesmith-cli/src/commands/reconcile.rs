//! `themesmith reconcile-all`, `themesmith reconcile` and `themesmith prereconcile`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use themesmith_core::ThemeConfig;
use themesmith_sync::{prereconcile, reconcile, ReconcileReport, ReconcileScope};

use super::{display_path, print_json, print_writes};

/// Arguments shared by both reconciliation scopes.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Report what would move without touching any tree.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub fn run(self, config: &ThemeConfig, scope: ReconcileScope) -> Result<()> {
        let layout = config.layout();
        let report = reconcile(&layout, config, scope, self.dry_run)
            .with_context(|| format!("{} reconciliation failed", scope_name(scope)))?;

        if self.json {
            return print_json(&report);
        }
        print_report(&report, layout.root());
        Ok(())
    }
}

fn scope_name(scope: ReconcileScope) -> &'static str {
    match scope {
        ReconcileScope::Full => "full",
        ReconcileScope::Partial => "partial",
    }
}

fn print_report(report: &ReconcileReport, root: &std::path::Path) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let store = report.store.as_deref().unwrap_or("<none>");
    println!(
        "{prefix}{} reconciliation for store {}",
        scope_name(report.scope),
        store.bold()
    );

    if report.total() == 0 {
        println!("{}", "download/ has nothing to reconcile".dimmed());
        return;
    }

    if !report.pruned.is_empty() {
        println!("pruned ({}):", report.pruned.len());
        for path in &report.pruned {
            println!("  {}  {}", "✗".red(), display_path(root, path));
        }
    }
    if !report.to_override.is_empty() {
        print_writes("override tree", root, &report.to_override, report.dry_run);
    }
    if !report.to_source.is_empty() {
        print_writes("source tree", root, &report.to_source, report.dry_run);
    }
}

/// Arguments for `themesmith prereconcile`.
#[derive(Args, Debug)]
pub struct PrereconcileArgs {
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub json: bool,
}

impl PrereconcileArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let layout = config.layout();
        let writes = prereconcile(&layout, self.dry_run).context("staging dist/ failed")?;
        if self.json {
            return print_json(&writes);
        }
        print_writes("copy:prereconcile", layout.root(), &writes, self.dry_run);
        Ok(())
    }
}
