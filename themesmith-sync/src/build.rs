//! Build task runner: source and override trees → `dist/`.
//!
//! Every copy goes through [`atomic_write`], so re-running a build over an
//! unchanged tree reports every file as `Unchanged`. Output from earlier
//! runs is never cleaned up.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use themesmith_core::{list_file_names, list_files, FileGroup, ThemeConfig, ThemeLayout, Tree};
use themesmith_transform::{AssetKind, StylePair, Toolchain};

use crate::error::{io_err, SyncError};
use crate::writer::{atomic_write, copy_file, remove, WriteResult};

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// One copy sub-task. [`CopyTask::series`] gives the order `build` runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyTask {
    /// Top-level scripts in `src/assets`, optionally minified.
    Js,
    /// Top-level styles in `src/assets`, pair-merged and compiled.
    Css,
    /// Verbatim copy of a group from the source tree.
    Group(FileGroup),
    /// Verbatim copy of a group from the override tree.
    Store(FileGroup),
}

impl CopyTask {
    /// All tasks in build order. Store tasks follow their generic task so
    /// override files win.
    pub fn series() -> Vec<CopyTask> {
        let mut tasks = vec![CopyTask::Js, CopyTask::Css];
        let mut deferred_templates_store = Vec::new();
        for group in FileGroup::all() {
            tasks.push(CopyTask::Group(*group));
            if !group.has_store_overrides() {
                continue;
            }
            // templates:store and templates:customers:store run after both
            // generic template tasks.
            if matches!(group, FileGroup::Templates | FileGroup::TemplatesCustomers) {
                deferred_templates_store.push(CopyTask::Store(*group));
            } else {
                tasks.push(CopyTask::Store(*group));
            }
        }
        tasks.extend(deferred_templates_store);
        tasks
    }

    /// Generic and store tasks for `group`, in that order.
    pub fn for_group(group: FileGroup) -> Vec<CopyTask> {
        let mut tasks = vec![CopyTask::Group(group)];
        if group.has_store_overrides() {
            tasks.push(CopyTask::Store(group));
        }
        tasks
    }

    pub fn label(&self) -> String {
        match self {
            CopyTask::Js => "js".to_string(),
            CopyTask::Css => "css".to_string(),
            CopyTask::Group(group) => group.label().to_string(),
            CopyTask::Store(group) => format!("{}:store", group.label()),
        }
    }
}

impl fmt::Display for CopyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for CopyTask {
    type Err = SyncError;

    /// Accepts `templates:customers:store` as well as `copy:templates:customers:store`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let wanted = wanted.strip_prefix("copy:").unwrap_or(wanted);
        CopyTask::series()
            .into_iter()
            .find(|task| task.label() == wanted)
            .ok_or_else(|| SyncError::UnknownTask(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a task needs; built once per process.
#[derive(Debug)]
pub struct BuildContext {
    pub layout: ThemeLayout,
    pub config: ThemeConfig,
    pub toolchain: Toolchain,
    pub dry_run: bool,
}

impl BuildContext {
    pub fn new(config: &ThemeConfig, dry_run: bool) -> Result<Self, SyncError> {
        Ok(Self {
            layout: config.layout(),
            config: config.clone(),
            toolchain: Toolchain::from_config(config)?,
            dry_run,
        })
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    fn assets_dir(&self) -> PathBuf {
        self.layout.source_dir(FileGroup::Assets)
    }

    fn dist_assets(&self) -> PathBuf {
        self.layout.dist_dir(FileGroup::Assets)
    }

}

/// Writes produced by one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub task: String,
    pub writes: Vec<WriteResult>,
}

/// Outcome of a full `build`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub tasks: Vec<TaskReport>,
}

impl BuildReport {
    pub fn writes(&self) -> impl Iterator<Item = &WriteResult> {
        self.tasks.iter().flat_map(|t| t.writes.iter())
    }

    pub fn changed(&self) -> usize {
        self.writes().filter(|w| w.is_change()).count()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run every copy task in [`CopyTask::series`] order.
pub fn build(ctx: &BuildContext) -> Result<BuildReport, SyncError> {
    let mut report = BuildReport::default();
    for task in CopyTask::series() {
        let writes = run_task(ctx, task)?;
        report.tasks.push(TaskReport {
            task: task.label(),
            writes,
        });
    }
    tracing::info!(
        changed = report.changed(),
        dry_run = ctx.dry_run,
        "build finished"
    );
    Ok(report)
}

/// Run a single copy task.
pub fn run_task(ctx: &BuildContext, task: CopyTask) -> Result<Vec<WriteResult>, SyncError> {
    tracing::debug!(task = %task, "running copy task");
    match task {
        CopyTask::Js => copy_scripts(ctx),
        CopyTask::Css => copy_styles(ctx),
        CopyTask::Group(FileGroup::Assets) => copy_plain_assets(ctx),
        CopyTask::Group(group) => {
            let src = ctx.layout.source_dir(group);
            copy_group(ctx, &src, group)
        }
        CopyTask::Store(group) => match ctx.layout.store_dir(group) {
            Some(src) => copy_group(ctx, &src, group),
            None => {
                tracing::debug!(task = %task, "no store override tree; skipping");
                Ok(Vec::new())
            }
        },
    }
}

fn copy_scripts(ctx: &BuildContext) -> Result<Vec<WriteResult>, SyncError> {
    let dir = ctx.assets_dir();
    let mut writes = Vec::new();
    for name in list_file_names(&dir)? {
        if AssetKind::classify(&name) == AssetKind::Script {
            if let Some(result) = write_script(ctx, &dir.join(&name))? {
                writes.push(result);
            }
        }
    }
    Ok(writes)
}

fn copy_styles(ctx: &BuildContext) -> Result<Vec<WriteResult>, SyncError> {
    let dir = ctx.assets_dir();
    let names = list_file_names(&dir)?;
    StylePair::collect(&dir, &names)
        .iter()
        .map(|pair| write_style(ctx, pair))
        .collect()
}

/// Assets that are neither scripts nor styles, plus every nested asset file.
fn copy_plain_assets(ctx: &BuildContext) -> Result<Vec<WriteResult>, SyncError> {
    let dir = ctx.assets_dir();
    let out = ctx.dist_assets();
    let mut writes = Vec::new();
    for path in list_files(&dir, true)? {
        let Some(name) = file_name(&path) else {
            continue;
        };
        let top_level = path.parent() == Some(dir.as_path());
        if top_level && AssetKind::classify(&name) != AssetKind::Verbatim {
            continue;
        }
        if let Some(result) = copy_file(&path, &out.join(&name), ctx.dry_run)? {
            writes.push(result);
        }
    }
    Ok(writes)
}

/// Copy the files of `group` found under `src` into the group's output
/// directory, flattening nested directories when the group does.
fn copy_group(
    ctx: &BuildContext,
    src: &Path,
    group: FileGroup,
) -> Result<Vec<WriteResult>, SyncError> {
    let out = ctx.layout.dist_dir(group);
    let mut writes = Vec::new();
    for path in list_files(src, group.flattens())? {
        let Some(name) = file_name(&path) else {
            continue;
        };
        if let Some(result) = copy_file(&path, &out.join(&name), ctx.dry_run)? {
            writes.push(result);
        }
    }
    Ok(writes)
}

// ---------------------------------------------------------------------------
// Single-file operations (shared with watch mode)
// ---------------------------------------------------------------------------

/// Minify-or-copy one script into `dist/assets`.
pub fn write_script(ctx: &BuildContext, src: &Path) -> Result<Option<WriteResult>, SyncError> {
    let Some(name) = file_name(src) else {
        return Ok(None);
    };
    let bytes = match std::fs::read(src) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(src, err)),
    };
    let output = ctx.toolchain.script(&name, &bytes)?;
    atomic_write(&ctx.dist_assets().join(&name), &output, ctx.dry_run).map(Some)
}

/// Merge, compile and write one style pair into `dist/assets`.
///
/// Merged sources are staged under `concat/assets/` first.
pub fn write_style(ctx: &BuildContext, pair: &StylePair) -> Result<WriteResult, SyncError> {
    let source = pair.merged_source()?;
    if pair.is_merged() && !ctx.dry_run {
        if let Some(concat) = ctx.layout.group_dir(Tree::Concat, FileGroup::Assets) {
            atomic_write(&concat.join(&pair.output_name), source.as_bytes(), false)?;
        }
    }
    let assets = ctx.assets_dir();
    let css = ctx
        .toolchain
        .style(&pair.output_name, &source, Some(assets.as_path()))?;
    atomic_write(
        &ctx.dist_assets().join(&pair.output_name),
        css.as_bytes(),
        ctx.dry_run,
    )
}

/// Copy a source-tree file to the same relative path under `dist/`.
///
/// When the store overrides that path, the override is copied instead.
pub fn mirror_source(ctx: &BuildContext, src: &Path) -> Result<Option<WriteResult>, SyncError> {
    let Some(dst) = mirror_path(&ctx.layout, src) else {
        return Ok(None);
    };
    match store_override(&ctx.layout, src) {
        Some(store_file) => copy_file(&store_file, &dst, ctx.dry_run),
        None => copy_file(src, &dst, ctx.dry_run),
    }
}

/// Override-tree file shadowing `src`, if the store ships one.
pub fn store_override(layout: &ThemeLayout, src: &Path) -> Option<PathBuf> {
    let (tree, group) = layout.classify(src)?;
    if tree != Tree::Source || !group.has_store_overrides() {
        return None;
    }
    let rel = src.strip_prefix(layout.tree_dir(Tree::Source)?).ok()?;
    let candidate = layout.tree_dir(Tree::Store)?.join(rel);
    candidate.is_file().then_some(candidate)
}

/// Delete one output file.
pub fn remove_output(ctx: &BuildContext, path: &Path) -> Result<bool, SyncError> {
    remove(path, ctx.dry_run)
}

/// `src/<rel>` → `dist/<rel>`. `None` for paths outside the source tree.
pub fn mirror_path(layout: &ThemeLayout, src: &Path) -> Option<PathBuf> {
    let src_root = layout.tree_dir(Tree::Source)?;
    let dist_root = layout.tree_dir(Tree::Dist)?;
    let rel = src.strip_prefix(&src_root).ok()?;
    Some(dist_root.join(rel))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
