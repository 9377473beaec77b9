pub mod build;
pub mod diff;
pub mod paths;
pub mod reconcile;
pub mod remote;
pub mod scaffold;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use themesmith_core::{ConfigOverrides, ConfigSources, StoreName, ThemeConfig};
use themesmith_sync::WriteResult;

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Project root containing `src/`, `stores/`, `dist/` and `download/`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Store environment; overrides `STORE` from the environment.
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Environment file to read instead of `<root>/.env`.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Config file to read instead of `<root>/themesmith.yaml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minify scripts regardless of `MINIMIZE_JS`.
    #[arg(long, global = true)]
    pub minify_js: bool,

    /// Minify styles regardless of `MINIMIZE_CSS`.
    #[arg(long, global = true)]
    pub minify_css: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<ThemeConfig> {
        let root = std::fs::canonicalize(&self.root)
            .with_context(|| format!("project root {} does not exist", self.root.display()))?;
        let sources = ConfigSources {
            config_file: self.config.clone(),
            env_file: self.env_file.clone(),
        };
        let overrides = ConfigOverrides {
            store: self.store.as_deref().map(StoreName::from),
            minimize_js: self.minify_js,
            minimize_css: self.minify_css,
        };
        ThemeConfig::load(&root, &sources, &overrides).context("failed to load configuration")
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}

/// `path` relative to the project root, for display.
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// One summary line plus one line per file.
pub fn print_writes(label: &str, root: &Path, writes: &[WriteResult], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let written = writes.iter().filter(|w| w.is_change()).count();
    let unchanged = writes.len() - written;

    if writes.is_empty() {
        println!("{prefix}✓ {label}: nothing to do");
        return;
    }
    println!("{prefix}✓ {label} ({written} written, {unchanged} unchanged)");

    for w in writes {
        let path = display_path(root, w.path());
        match w {
            WriteResult::Written { .. } => println!("  ✎  {path}"),
            WriteResult::WouldWrite { .. } => println!("  ~  {path}"),
            WriteResult::Unchanged { .. } => println!("  ·  {path}"),
        }
    }
}
