//! Dry-run unified diff support for `themesmith diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use similar::TextDiff;

use themesmith_core::{ThemeConfig, ThemeLayout, Tree};

use crate::error::io_err;
use crate::reconcile::{self, PlanOptions, ReconcilePlan, ReconcileScope};
use crate::SyncError;

/// A single file that reconciliation would overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Preview of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub plan: ReconcilePlan,
    pub diffs: Vec<FileDiff>,
}

/// Plan a reconciliation and diff every file it would change.
///
/// No files are written.
pub fn diff_reconcile(
    layout: &ThemeLayout,
    config: &ThemeConfig,
    scope: ReconcileScope,
) -> Result<DiffReport, SyncError> {
    let (overrides, download) = reconcile::scan(layout, scope)?;
    let plan = reconcile::plan(scope, &overrides, &download, &PlanOptions::from_config(config));

    let mut diffs = Vec::new();
    for (group, name) in plan.to_override.iter() {
        let Some(target) = layout.group_dir(Tree::Store, group) else {
            continue;
        };
        let snapshot = layout.download_dir(group).join(name);
        if let Some(diff) = diff_file(layout.root(), &target.join(name), &snapshot)? {
            diffs.push(diff);
        }
    }
    for (group, name) in plan.to_source.iter() {
        let snapshot = layout.download_dir(group).join(name);
        let target = layout.source_dir(group).join(name);
        if let Some(diff) = diff_file(layout.root(), &target, &snapshot)? {
            diffs.push(diff);
        }
    }

    Ok(DiffReport { plan, diffs })
}

fn diff_file(root: &Path, target: &Path, snapshot: &Path) -> Result<Option<FileDiff>, SyncError> {
    let existing = read_existing_or_empty(target)?;
    let incoming = read_existing_or_empty(snapshot)?;
    if existing == incoming {
        return Ok(None);
    }

    let relative = target.strip_prefix(root).unwrap_or(target);
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified = TextDiff::from_lines(&existing, &incoming)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(FileDiff {
        path: target.to_path_buf(),
        unified_diff: unified,
    }))
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(normalize_line_endings(&String::from_utf8_lossy(&bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use themesmith_core::StoreName;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, ThemeLayout, ThemeConfig) {
        let root = TempDir::new().expect("root");
        let mut config = ThemeConfig::defaults(root.path());
        config.store = Some(StoreName::from("uk"));
        let layout = config.layout();
        (root, layout, config)
    }

    #[test]
    fn remote_edit_produces_unified_diff() {
        let (root, layout, config) = setup();
        write(root.path(), "stores/uk/config/settings_data.json", "{\n\"a\": 1\n}\n");
        write(root.path(), "download/config/settings_data.json", "{\n\"a\": 2\n}\n");

        let report = diff_reconcile(&layout, &config, ReconcileScope::Full).expect("diff");
        assert_eq!(report.diffs.len(), 1);
        let diff = &report.diffs[0].unified_diff;
        assert!(diff.contains("--- a/stores/uk/config/settings_data.json"));
        assert!(diff.contains("+++ b/stores/uk/config/settings_data.json"));
        assert!(diff.contains("@@"));
    }

    #[test]
    fn identical_files_produce_no_diff_and_nothing_moves() {
        let (root, layout, config) = setup();
        write(root.path(), "src/layout/theme.liquid", "same");
        write(root.path(), "download/layout/theme.liquid", "same");

        let report = diff_reconcile(&layout, &config, ReconcileScope::Full).expect("diff");
        assert!(report.diffs.is_empty());
        assert!(root.path().join("download/layout/theme.liquid").exists());
    }

    #[test]
    fn new_remote_file_diffs_against_empty() {
        let (root, layout, config) = setup();
        write(root.path(), "download/templates/page.json", "{}\n");

        let report = diff_reconcile(&layout, &config, ReconcileScope::Partial).expect("diff");
        assert_eq!(report.diffs.len(), 1);
        assert!(report.diffs[0].unified_diff.contains("+{}"));
    }
}
