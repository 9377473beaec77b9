//! `themesmith build` and `themesmith copy [task]`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use themesmith_core::ThemeConfig;
use themesmith_sync::{build, run_task, BuildContext, BuildReport, CopyTask, TaskReport};

use super::{print_json, print_writes};

/// Arguments for `themesmith build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Report what would be written without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Print every file, including unchanged ones.
    #[arg(long, short)]
    pub verbose: bool,
}

impl BuildArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let ctx = BuildContext::new(config, self.dry_run).context("failed to set up build")?;
        let report = build(&ctx).context("build failed")?;
        print_report(&ctx, &report, self.json, self.verbose)
    }
}

/// Arguments for `themesmith copy`.
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Task label such as `js`, `layout:store` or `copy:templates:customers`.
    /// Runs every task when omitted.
    pub task: Option<String>,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub json: bool,

    #[arg(long, short)]
    pub verbose: bool,
}

impl CopyArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let tasks = match self.task.as_deref() {
            Some(label) => vec![label.parse::<CopyTask>()?],
            None => CopyTask::series(),
        };

        let ctx = BuildContext::new(config, self.dry_run).context("failed to set up build")?;
        let mut report = BuildReport::default();
        for task in tasks {
            let writes = run_task(&ctx, task).with_context(|| format!("copy:{task} failed"))?;
            report.tasks.push(TaskReport {
                task: task.label(),
                writes,
            });
        }
        print_report(&ctx, &report, self.json, self.verbose)
    }
}

fn print_report(ctx: &BuildContext, report: &BuildReport, json: bool, verbose: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    let root = ctx.layout.root();
    for task in &report.tasks {
        if verbose {
            print_writes(&format!("copy:{}", task.task), root, &task.writes, ctx.dry_run);
            continue;
        }
        let changed: Vec<_> = task.writes.iter().filter(|w| w.is_change()).cloned().collect();
        if !changed.is_empty() {
            print_writes(&format!("copy:{}", task.task), root, &changed, ctx.dry_run);
        }
    }

    let total = report.writes().count();
    let changed = report.changed();
    let summary = format!(
        "{} task(s), {changed} of {total} file(s) {}",
        report.tasks.len(),
        if ctx.dry_run { "would change" } else { "changed" },
    );
    if changed == 0 {
        println!("{}", summary.dimmed());
    } else {
        println!("{}", summary.green());
    }
    Ok(())
}
