//! Themesmith: theme asset pipeline CLI.
//!
//! # Usage
//!
//! ```text
//! themesmith [--root <dir>] [--store <name>] build [--dry-run] [--json]
//! themesmith copy [<task>] [--dry-run]
//! themesmith watch
//! themesmith reconcile-all | reconcile [--dry-run] [--json]
//! themesmith prereconcile [--dry-run]
//! themesmith scaffold
//! themesmith download [-a|--all]
//! themesmith sync
//! themesmith upload
//! themesmith diff [--partial]
//! themesmith paths [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    build::{BuildArgs, CopyArgs},
    diff::DiffArgs,
    paths::PathsArgs,
    reconcile::{PrereconcileArgs, ReconcileArgs},
    remote::{DownloadArgs, SyncArgs, UploadArgs},
    GlobalArgs, LogFormat,
};
use themesmith_sync::ReconcileScope;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "themesmith",
    version,
    about = "Build, watch and reconcile a storefront theme across store environments",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every copy task in order, writing `dist/`.
    Build(BuildArgs),

    /// Run one copy task (e.g. `layout`, `templates:customers:store`), or all of them.
    Copy(CopyArgs),

    /// Watch `src/` and the override tree and rebuild what changed.
    Watch,

    /// Full reconciliation of `download/` into the override and source trees.
    #[command(name = "reconcile-all", alias = "reconcileall")]
    ReconcileAll(ReconcileArgs),

    /// Partial reconciliation (sections, config, locales, templates).
    Reconcile(ReconcileArgs),

    /// Stage the current build output into `download/`.
    #[command(alias = "copy:prereconcile")]
    Prereconcile(PrereconcileArgs),

    /// Create the override directories for the configured store.
    Scaffold,

    /// Reset `download/`, stage the build output, then download the whole theme.
    Download(DownloadArgs),

    /// Reset `download/`, stage the build output, then download config, locales and templates.
    Sync(SyncArgs),

    /// Upload `dist/` to the configured store.
    Upload(UploadArgs),

    /// Show unified diffs of what reconciliation would overwrite.
    Diff(DiffArgs),

    /// Print the path registry.
    Paths(PathsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_format);
    let config = cli.global.load_config()?;

    match cli.command {
        Commands::Build(args) => args.run(&config),
        Commands::Copy(args) => args.run(&config),
        Commands::Watch => commands::watch::run(&config),
        Commands::ReconcileAll(args) => args.run(&config, ReconcileScope::Full),
        Commands::Reconcile(args) => args.run(&config, ReconcileScope::Partial),
        Commands::Prereconcile(args) => args.run(&config),
        Commands::Scaffold => commands::scaffold::run(&config),
        Commands::Download(args) => args.run(&config),
        Commands::Sync(args) => args.run(&config),
        Commands::Upload(args) => args.run(&config),
        Commands::Diff(args) => args.run(&config),
        Commands::Paths(args) => args.run(&config),
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
