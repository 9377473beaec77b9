//! Reconciliation: merge a downloaded remote snapshot back into the
//! override and source trees.
//!
//! The decision of what moves where is a pure function over two
//! [`Manifest`]s ([`plan`]); [`apply`] carries it out. Store-specific files
//! are handled first, so everything still left in the snapshot afterwards
//! falls through to the generic source tree.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use themesmith_core::{list_files, FileGroup, Manifest, ThemeConfig, ThemeLayout, Tree};

use crate::error::{io_err, SyncError};
use crate::writer::{copy_file, remove, WriteResult};

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which reconciliation entry point is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileScope {
    /// Prune the snapshot, then reconcile every group.
    Full,
    /// No pruning; sections, templates, config and locales only.
    Partial,
}

impl ReconcileScope {
    /// Groups whose override-tree files are refreshed from the snapshot.
    pub fn store_groups(&self) -> &'static [FileGroup] {
        match self {
            ReconcileScope::Full => &[
                FileGroup::Config,
                FileGroup::Layout,
                FileGroup::Locales,
                FileGroup::Sections,
                FileGroup::Templates,
                FileGroup::TemplatesCustomers,
            ],
            ReconcileScope::Partial => &[
                FileGroup::Sections,
                FileGroup::Config,
                FileGroup::Locales,
                FileGroup::Templates,
                FileGroup::TemplatesCustomers,
            ],
        }
    }

    /// Groups whose remaining snapshot files are promoted into `src/`.
    pub fn sweep_groups(&self) -> &'static [FileGroup] {
        match self {
            ReconcileScope::Full => FileGroup::all(),
            ReconcileScope::Partial => &[
                FileGroup::Sections,
                FileGroup::Templates,
                FileGroup::TemplatesCustomers,
            ],
        }
    }

    pub fn prunes(&self) -> bool {
        matches!(self, ReconcileScope::Full)
    }
}

// ---------------------------------------------------------------------------
// Planning (pure)
// ---------------------------------------------------------------------------

/// Knobs of the prune step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Config files that survive pruning.
    pub protected_config: Vec<String>,
    /// Locale files starting with this prefix are pruned.
    pub locale_prune_prefix: String,
}

impl PlanOptions {
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self {
            protected_config: config.protected_config.clone(),
            locale_prune_prefix: config.locale_prune_prefix.clone(),
        }
    }
}

/// What a reconciliation run will do, expressed over snapshot file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub scope: ReconcileScope,
    /// Snapshot files deleted before anything else.
    pub prune: Manifest,
    /// Snapshot files copied into the override tree, then removed from the
    /// snapshot.
    pub to_override: Manifest,
    /// Snapshot files moved into the source tree.
    pub to_source: Manifest,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.prune.is_empty() && self.to_override.is_empty() && self.to_source.is_empty()
    }
}

/// Compute the plan for `scope`.
///
/// `overrides` lists the override tree, `download` the snapshot; neither
/// needs to be pre-filtered.
pub fn plan(
    scope: ReconcileScope,
    overrides: &Manifest,
    download: &Manifest,
    options: &PlanOptions,
) -> ReconcilePlan {
    let prune = if scope.prunes() {
        download.filter(|group, name| match group {
            FileGroup::Config => !options.protected_config.iter().any(|p| p == name),
            FileGroup::Locales => name.starts_with(&options.locale_prune_prefix),
            _ => false,
        })
    } else {
        Manifest::new()
    };
    let remaining = download.difference(&prune);

    let store_files = overrides
        .restrict(scope.store_groups())
        .filter(|group, name| group.reconciles_store_file(name));
    let to_override = store_files.intersect(&remaining);

    let to_source = remaining
        .difference(&to_override)
        .restrict(scope.sweep_groups())
        .filter(|group, name| group.sweeps_remote_file(name));

    ReconcilePlan {
        scope,
        prune,
        to_override,
        to_source,
    }
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// Summary of a reconciliation run, serialisable for `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub scope: ReconcileScope,
    pub store: Option<String>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pruned: Vec<PathBuf>,
    pub to_override: Vec<WriteResult>,
    pub to_source: Vec<WriteResult>,
}

impl ReconcileReport {
    pub fn total(&self) -> usize {
        self.pruned.len() + self.to_override.len() + self.to_source.len()
    }
}

/// Carry out `plan` against the filesystem.
///
/// Snapshot files that disappeared since the plan was made are skipped.
pub fn apply(
    layout: &ThemeLayout,
    plan: &ReconcilePlan,
    dry_run: bool,
) -> Result<ReconcileReport, SyncError> {
    let started_at = Utc::now();

    let mut pruned = Vec::new();
    for (group, name) in plan.prune.iter() {
        let path = layout.download_dir(group).join(name);
        if remove(&path, dry_run)? {
            pruned.push(path);
        }
    }

    let mut to_override = Vec::new();
    for (group, name) in plan.to_override.iter() {
        let Some(store_dir) = layout.group_dir(Tree::Store, group) else {
            continue;
        };
        let snapshot = layout.download_dir(group).join(name);
        if let Some(result) = copy_file(&snapshot, &store_dir.join(name), dry_run)? {
            remove(&snapshot, dry_run)?;
            to_override.push(result);
        }
    }

    let mut to_source = Vec::new();
    for (group, name) in plan.to_source.iter() {
        let snapshot = layout.download_dir(group).join(name);
        let target = layout.source_dir(group).join(name);
        if let Some(result) = copy_file(&snapshot, &target, dry_run)? {
            remove(&snapshot, dry_run)?;
            to_source.push(result);
        }
    }

    let report = ReconcileReport {
        scope: plan.scope,
        store: layout.store().map(|s| s.0.clone()),
        dry_run,
        started_at,
        finished_at: Utc::now(),
        pruned,
        to_override,
        to_source,
    };
    tracing::info!(
        scope = ?report.scope,
        pruned = report.pruned.len(),
        to_override = report.to_override.len(),
        to_source = report.to_source.len(),
        dry_run,
        "reconciliation finished"
    );
    Ok(report)
}

/// List the override tree and the snapshot for `scope`.
pub fn scan(layout: &ThemeLayout, scope: ReconcileScope) -> Result<(Manifest, Manifest), SyncError> {
    let overrides = Manifest::scan(layout, Tree::Store, scope.store_groups(), |group, name| {
        group.reconciles_store_file(name)
    })?;
    let download = Manifest::scan(layout, Tree::Download, FileGroup::all(), |_, _| true)?;
    Ok((overrides, download))
}

/// Scan, plan and apply in one go.
pub fn reconcile(
    layout: &ThemeLayout,
    config: &ThemeConfig,
    scope: ReconcileScope,
    dry_run: bool,
) -> Result<ReconcileReport, SyncError> {
    let (overrides, download) = scan(layout, scope)?;
    if layout.tree_dir(Tree::Store).is_none() {
        tracing::warn!("no override tree for this store; only the generic sweep will run");
    }
    let plan = plan(scope, &overrides, &download, &PlanOptions::from_config(config));
    apply(layout, &plan, dry_run)
}

// ---------------------------------------------------------------------------
// Snapshot staging
// ---------------------------------------------------------------------------

/// Copy the current build output into the snapshot tree, preserving
/// relative paths.
pub fn prereconcile(layout: &ThemeLayout, dry_run: bool) -> Result<Vec<WriteResult>, SyncError> {
    let dist = layout.root().join("dist");
    let download = layout.root().join("download");
    let mut writes = Vec::new();
    for path in list_files(&dist, true)? {
        let Ok(rel) = path.strip_prefix(&dist) else {
            continue;
        };
        if let Some(result) = copy_file(&path, &download.join(rel), dry_run)? {
            writes.push(result);
        }
    }
    tracing::info!(files = writes.len(), "staged build output into download/");
    Ok(writes)
}

/// Remove and recreate the snapshot tree.
pub fn reset_download(layout: &ThemeLayout) -> Result<(), SyncError> {
    let download = layout.root().join("download");
    match std::fs::remove_dir_all(&download) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(&download, err)),
    }
    std::fs::create_dir_all(&download).map_err(|e| io_err(&download, e))?;
    tracing::debug!(path = %download.display(), "reset download tree");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn m(entries: &[(FileGroup, &str)]) -> Manifest {
        entries.iter().map(|(g, n)| (*g, *n)).collect()
    }

    fn options() -> PlanOptions {
        PlanOptions::from_config(&ThemeConfig::defaults("/t"))
    }

    #[test]
    fn no_overrides_only_sweeps() {
        let download = m(&[
            (FileGroup::Layout, "theme.liquid"),
            (FileGroup::Templates, "index.json"),
        ]);
        let p = plan(ReconcileScope::Full, &Manifest::new(), &download, &options());
        assert!(p.to_override.is_empty());
        assert_eq!(p.to_source, download);
    }

    #[test]
    fn override_files_are_taken_out_of_the_sweep() {
        let overrides = m(&[
            (FileGroup::Config, "settings_data.json"),
            (FileGroup::Layout, "theme.liquid"),
        ]);
        let download = m(&[
            (FileGroup::Config, "settings_data.json"),
            (FileGroup::Config, "settings_schema.json"),
            (FileGroup::Layout, "theme.liquid"),
            (FileGroup::Layout, "password.liquid"),
        ]);
        let p = plan(ReconcileScope::Full, &overrides, &download, &options());
        assert_eq!(p.to_override, overrides);
        assert_eq!(
            p.to_source,
            m(&[
                (FileGroup::Config, "settings_schema.json"),
                (FileGroup::Layout, "password.liquid"),
            ])
        );
    }

    #[test]
    fn full_scope_prunes_config_and_default_locales() {
        let download = m(&[
            (FileGroup::Config, "settings_data.json"),
            (FileGroup::Config, "markets.json"),
            (FileGroup::Locales, "en_default.json"),
            (FileGroup::Locales, "fr.json"),
        ]);
        let p = plan(ReconcileScope::Full, &Manifest::new(), &download, &options());
        assert_eq!(
            p.prune,
            m(&[
                (FileGroup::Config, "markets.json"),
                (FileGroup::Locales, "en_default.json"),
            ])
        );
        assert!(!p.to_source.contains(FileGroup::Config, "markets.json"));
        assert!(p.to_source.contains(FileGroup::Locales, "fr.json"));
    }

    #[test]
    fn pruned_files_never_reach_the_override_tree() {
        let overrides = m(&[(FileGroup::Config, "markets.json")]);
        let download = m(&[(FileGroup::Config, "markets.json")]);
        let p = plan(ReconcileScope::Full, &overrides, &download, &options());
        assert!(p.to_override.is_empty());
        assert!(p.prune.contains(FileGroup::Config, "markets.json"));
    }

    #[test]
    fn partial_scope_neither_prunes_nor_sweeps_config() {
        let overrides = m(&[(FileGroup::Locales, "en_default.json")]);
        let download = m(&[
            (FileGroup::Config, "markets.json"),
            (FileGroup::Locales, "en_default.json"),
            (FileGroup::Layout, "theme.liquid"),
            (FileGroup::Sections, "header-group.json"),
        ]);
        let p = plan(ReconcileScope::Partial, &overrides, &download, &options());
        assert!(p.prune.is_empty());
        assert_eq!(p.to_override, overrides);
        assert_eq!(p.to_source, m(&[(FileGroup::Sections, "header-group.json")]));
    }

    #[test]
    fn sections_reconcile_json_only() {
        let overrides = m(&[
            (FileGroup::Sections, "header-group.json"),
            (FileGroup::Sections, "hero.liquid"),
        ]);
        let download = m(&[
            (FileGroup::Sections, "header-group.json"),
            (FileGroup::Sections, "hero.liquid"),
        ]);
        let p = plan(ReconcileScope::Full, &overrides, &download, &options());
        assert_eq!(p.to_override, m(&[(FileGroup::Sections, "header-group.json")]));
        assert_eq!(p.to_source, m(&[(FileGroup::Sections, "hero.liquid")]));
    }

    #[test]
    fn sweep_skips_remote_scripts_and_styles() {
        let download = m(&[
            (FileGroup::Assets, "theme.js"),
            (FileGroup::Assets, "base.css"),
            (FileGroup::Assets, "logo.svg"),
        ]);
        let p = plan(ReconcileScope::Full, &Manifest::new(), &download, &options());
        assert_eq!(p.to_source, m(&[(FileGroup::Assets, "logo.svg")]));
    }

    #[test]
    fn empty_inputs_plan_nothing() {
        let p = plan(
            ReconcileScope::Full,
            &Manifest::new(),
            &Manifest::new(),
            &options(),
        );
        assert!(p.is_empty());
    }
}
