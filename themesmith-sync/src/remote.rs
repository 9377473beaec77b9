//! Invocation of the external theme CLI.
//!
//! The CLI is an opaque collaborator: it receives flags and its exit code and
//! output are logged. A failed or missing CLI is a warning, never an error,
//! so the caller decides what a failure means.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use themesmith_core::{StoreName, ThemeConfig, ThemeLayout};

use crate::error::SyncError;
use crate::reconcile::{prereconcile, reset_download};

/// Group filter used by the partial sync driver.
pub const PARTIAL_FILTERS: &[&str] = &["config", "locales", "templates/*.json"];

/// A fully-specified theme CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeCommand {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl ThemeCommand {
    /// `<cli> download [filters...] --env <store> --dir <dir> [--ignores <file>]`
    pub fn download(
        cli: &str,
        cwd: &Path,
        store: &StoreName,
        dir: &str,
        ignore_file: Option<&Path>,
        filters: &[&str],
    ) -> Self {
        let mut cmd = Self::base(cli, cwd);
        cmd.args.push("download".to_string());
        cmd.args.extend(filters.iter().map(|f| f.to_string()));
        cmd.push_target(store, dir);
        if let Some(file) = ignore_file {
            cmd.args.push("--ignores".to_string());
            cmd.args.push(file.display().to_string());
        }
        cmd
    }

    /// `<cli> deploy --env <store> --dir <dir>`
    pub fn deploy(cli: &str, cwd: &Path, store: &StoreName, dir: &str) -> Self {
        let mut cmd = Self::base(cli, cwd);
        cmd.args.push("deploy".to_string());
        cmd.push_target(store, dir);
        cmd
    }

    /// The configured CLI may carry leading arguments (`shopify theme`).
    fn base(cli: &str, cwd: &Path) -> Self {
        let mut words = cli.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self {
            program,
            args: words.collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    fn push_target(&mut self, store: &StoreName, dir: &str) {
        self.args.extend([
            "--env".to_string(),
            store.0.clone(),
            "--dir".to_string(),
            dir.to_string(),
        ]);
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What the CLI did. Nothing here is fed back into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteOutcome {
    pub command: String,
    /// `None` when the process could not be spawned or was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `command` to completion.
pub fn run(command: &ThemeCommand) -> RemoteOutcome {
    let rendered = command.display();
    tracing::info!(command = %rendered, "running theme CLI");

    let output = Command::new(&command.program)
        .args(&command.args)
        .current_dir(&command.cwd)
        .output();

    let outcome = match output {
        Ok(output) => RemoteOutcome {
            command: rendered,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(err) => {
            tracing::warn!(command = %rendered, error = %err, "failed to start theme CLI");
            return RemoteOutcome {
                command: rendered,
                exit_code: None,
                stdout: String::new(),
                stderr: err.to_string(),
            };
        }
    };

    for line in outcome.stdout.lines().filter(|l| !l.trim().is_empty()) {
        tracing::info!(target: "themesmith::remote", "stdout: {line}");
    }
    for line in outcome.stderr.lines().filter(|l| !l.trim().is_empty()) {
        tracing::info!(target: "themesmith::remote", "stderr: {line}");
    }
    if outcome.success() {
        tracing::info!(command = %outcome.command, "theme CLI finished");
    } else {
        tracing::warn!(
            command = %outcome.command,
            exit_code = ?outcome.exit_code,
            "theme CLI failed"
        );
    }
    outcome
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Outcome of a fetch driver.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    /// Files copied from `dist/` into `download/` before fetching.
    pub staged: usize,
    pub remote: RemoteOutcome,
}

/// Reset `download/`, stage the build output into it, then download the
/// whole theme. The ignore file is passed unless `bypass_ignores`.
pub fn fetch_full(
    layout: &ThemeLayout,
    config: &ThemeConfig,
    bypass_ignores: bool,
) -> Result<FetchReport, SyncError> {
    let store = required_store(layout)?;
    let ignore_file = (!bypass_ignores).then(|| config.ignore_file_path());
    let command = ThemeCommand::download(
        &config.theme_cli,
        layout.root(),
        store,
        "download",
        ignore_file.as_deref(),
        &[],
    );
    fetch(layout, &command)
}

/// Like [`fetch_full`] but only downloads [`PARTIAL_FILTERS`].
pub fn fetch_partial(layout: &ThemeLayout, config: &ThemeConfig) -> Result<FetchReport, SyncError> {
    let store = required_store(layout)?;
    let command = ThemeCommand::download(
        &config.theme_cli,
        layout.root(),
        store,
        "download",
        None,
        PARTIAL_FILTERS,
    );
    fetch(layout, &command)
}

/// Upload the build output.
pub fn deploy(layout: &ThemeLayout, config: &ThemeConfig) -> Result<RemoteOutcome, SyncError> {
    let store = required_store(layout)?;
    let command = ThemeCommand::deploy(&config.theme_cli, layout.root(), store, "dist");
    Ok(run(&command))
}

fn fetch(layout: &ThemeLayout, command: &ThemeCommand) -> Result<FetchReport, SyncError> {
    reset_download(layout)?;
    let staged = prereconcile(layout, false)?.len();
    let remote = run(command);
    Ok(FetchReport { staged, remote })
}

fn required_store(layout: &ThemeLayout) -> Result<&StoreName, SyncError> {
    layout
        .store()
        .filter(|s| !s.0.trim().is_empty())
        .ok_or(SyncError::StoreRequired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn full_download_args_include_ignores() {
        let cmd = ThemeCommand::download(
            "theme",
            Path::new("/t"),
            &StoreName::from("uk"),
            "download",
            Some(Path::new(".theme_ignores")),
            &[],
        );
        assert_eq!(cmd.program(), "theme");
        assert_eq!(
            cmd.args(),
            ["download", "--env", "uk", "--dir", "download", "--ignores", ".theme_ignores"]
        );
    }

    #[test]
    fn partial_download_puts_filters_first() {
        let cmd = ThemeCommand::download(
            "theme",
            Path::new("/t"),
            &StoreName::from("uk"),
            "download",
            None,
            PARTIAL_FILTERS,
        );
        assert_eq!(
            cmd.display(),
            "theme download config locales templates/*.json --env uk --dir download"
        );
    }

    #[test]
    fn cli_with_leading_words_is_split() {
        let cmd = ThemeCommand::deploy("shopify theme", Path::new("/t"), &StoreName::from("eu"), "dist");
        assert_eq!(cmd.program(), "shopify");
        assert_eq!(cmd.args(), ["theme", "deploy", "--env", "eu", "--dir", "dist"]);
    }

    #[test]
    fn missing_program_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let cmd = ThemeCommand::deploy(
            "themesmith-no-such-cli",
            dir.path(),
            &StoreName::from("uk"),
            "dist",
        );
        let outcome = run(&cmd);
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, None);
    }

    #[test]
    fn fetch_requires_store() {
        let dir = TempDir::new().unwrap();
        let config = ThemeConfig::defaults(dir.path());
        let err = fetch_partial(&config.layout(), &config).unwrap_err();
        assert!(matches!(err, SyncError::StoreRequired));
    }

    #[cfg(unix)]
    #[test]
    fn fetch_resets_and_stages_before_running() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("dist/layout")).unwrap();
        std::fs::write(dir.path().join("dist/layout/theme.liquid"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("download/stale")).unwrap();
        std::fs::write(dir.path().join("download/stale/old.json"), "{}").unwrap();

        let mut config = ThemeConfig::defaults(dir.path());
        config.store = Some(StoreName::from("uk"));
        config.theme_cli = "true".to_string();

        let report = fetch_full(&config.layout(), &config, false).unwrap();
        assert!(report.remote.success());
        let ignores = dir.path().join(".theme_ignores");
        assert!(report
            .remote
            .command
            .ends_with(&format!("--ignores {}", ignores.display())));
        assert_eq!(report.staged, 1);
        assert!(dir.path().join("download/layout/theme.liquid").is_file());
        assert!(!dir.path().join("download/stale").exists());
    }
}
