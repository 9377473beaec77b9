//! Mapping of filesystem changes to rebuild jobs.
//!
//! [`jobs_for_event`] is pure apart from existence checks done while
//! resolving style pairs, so the whole table can be tested without a
//! watcher.

use std::path::{Path, PathBuf};

use themesmith_core::{FileGroup, ThemeLayout, Tree};
use themesmith_sync::build::{
    mirror_path, mirror_source, remove_output, run_task, store_override, write_script,
    write_style,
};
use themesmith_sync::{BuildContext, CopyTask, SyncError, WriteResult};
use themesmith_transform::{AssetKind, StylePair};

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Created or modified.
    Write,
    /// Deleted or renamed away.
    Remove,
}

/// The minimal rebuild step for one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchJob {
    /// Re-run the generic and store copy tasks of a group.
    CopyGroup(FileGroup),
    /// Recompile one style pair.
    Style(StylePair),
    /// Recompile every style pair; a partial may be imported by any of them.
    Styles,
    /// Minify-or-copy one script.
    Script(PathBuf),
    /// Copy a source file to the same relative path under `dist/`.
    Mirror(PathBuf),
    /// Delete one output file.
    Remove(PathBuf),
}

impl WatchJob {
    /// The group output directory this job writes into. Jobs sharing a key
    /// run one after another in arrival order.
    pub fn output_key(&self, layout: &ThemeLayout) -> PathBuf {
        match self {
            WatchJob::CopyGroup(group) => layout.dist_dir(*group),
            WatchJob::Style(_) | WatchJob::Styles | WatchJob::Script(_) => {
                layout.dist_dir(FileGroup::Assets)
            }
            WatchJob::Mirror(src) => match layout.classify(src) {
                Some((_, group)) => layout.dist_dir(group),
                None => layout.root().join("dist"),
            },
            WatchJob::Remove(path) => match layout.classify(path) {
                Some((Tree::Dist, group)) => layout.dist_dir(group),
                _ => path.clone(),
            },
        }
    }

    /// Execute the job.
    pub fn run(&self, ctx: &BuildContext) -> Result<Vec<WriteResult>, SyncError> {
        match self {
            WatchJob::CopyGroup(group) => {
                let mut writes = Vec::new();
                for task in CopyTask::for_group(*group) {
                    writes.extend(run_task(ctx, task)?);
                }
                Ok(writes)
            }
            WatchJob::Style(pair) => Ok(vec![write_style(ctx, pair)?]),
            WatchJob::Styles => run_task(ctx, CopyTask::Css),
            WatchJob::Script(src) => Ok(write_script(ctx, src)?.into_iter().collect()),
            WatchJob::Mirror(src) => Ok(mirror_source(ctx, src)?.into_iter().collect()),
            WatchJob::Remove(path) => {
                remove_output(ctx, path)?;
                Ok(Vec::new())
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            WatchJob::CopyGroup(group) => format!("copy {group}"),
            WatchJob::Style(pair) => format!("compile {}", pair.output_name),
            WatchJob::Styles => "compile styles".to_string(),
            WatchJob::Script(src) => format!("script {}", src.display()),
            WatchJob::Mirror(src) => format!("mirror {}", src.display()),
            WatchJob::Remove(path) => format!("remove {}", path.display()),
        }
    }
}

/// Jobs triggered by `change` at `path`.
///
/// | Location                         | Write               | Remove          |
/// |----------------------------------|---------------------|-----------------|
/// | `src/config`, `src/locales`      | `CopyGroup`         | nothing         |
/// | anywhere in the override tree    | `CopyGroup`         | nothing         |
/// | style in `src/assets`            | `Style` (paired)    | `Remove` output |
/// | override style in `src/assets`   | `Style` (paired)    | nothing         |
/// | `_partial.scss` in `src/assets`  | `Styles`            | nothing         |
/// | script in `src/assets`           | `Script`            | `Remove` mirror |
/// | any other source file            | `Mirror`            | `Remove` mirror |
/// | source file the store overrides  | `Mirror` (override) | `Mirror`        |
pub fn jobs_for_event(layout: &ThemeLayout, path: &Path, change: ChangeKind) -> Vec<WatchJob> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    if name.starts_with('.') {
        return Vec::new();
    }
    if change == ChangeKind::Write && path.is_dir() {
        return Vec::new();
    }
    let Some((tree, group)) = layout.classify(path) else {
        return Vec::new();
    };

    match (tree, group, change) {
        (Tree::Store, _, ChangeKind::Write) => vec![WatchJob::CopyGroup(group)],
        (Tree::Source, FileGroup::Config | FileGroup::Locales, ChangeKind::Write) => {
            vec![WatchJob::CopyGroup(group)]
        }
        (Tree::Source, FileGroup::Config | FileGroup::Locales, ChangeKind::Remove) => Vec::new(),
        (Tree::Source, FileGroup::Assets, _) if is_top_level_asset(layout, path) => {
            asset_jobs(layout, path, name, change)
        }
        (Tree::Source, _, ChangeKind::Write) => vec![WatchJob::Mirror(path.to_path_buf())],
        (Tree::Source, _, ChangeKind::Remove) if store_override(layout, path).is_some() => {
            vec![WatchJob::Mirror(path.to_path_buf())]
        }
        (Tree::Source, _, ChangeKind::Remove) => mirror_path(layout, path)
            .map(WatchJob::Remove)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn is_top_level_asset(layout: &ThemeLayout, path: &Path) -> bool {
    path.parent() == Some(layout.source_dir(FileGroup::Assets).as_path())
}

fn asset_jobs(layout: &ThemeLayout, path: &Path, name: &str, change: ChangeKind) -> Vec<WatchJob> {
    let dir = layout.source_dir(FileGroup::Assets);
    let kind = AssetKind::classify(name);
    match (kind, change) {
        (AssetKind::Style | AssetKind::StyleOverride { .. }, ChangeKind::Write) => {
            StylePair::resolve(&dir, name)
                .map(WatchJob::Style)
                .into_iter()
                .collect()
        }
        (AssetKind::StyleOverride { .. }, ChangeKind::Remove) => Vec::new(),
        (kind @ AssetKind::Style, ChangeKind::Remove) => {
            let output = layout
                .dist_dir(FileGroup::Assets)
                .join(kind.output_name(name));
            vec![WatchJob::Remove(output)]
        }
        (AssetKind::Partial, ChangeKind::Write) => vec![WatchJob::Styles],
        (AssetKind::Partial, ChangeKind::Remove) => Vec::new(),
        (AssetKind::Script, ChangeKind::Write) => vec![WatchJob::Script(path.to_path_buf())],
        (AssetKind::Verbatim, ChangeKind::Write) => vec![WatchJob::Mirror(path.to_path_buf())],
        (AssetKind::Script | AssetKind::Verbatim, ChangeKind::Remove) => {
            vec![WatchJob::Remove(
                layout.dist_dir(FileGroup::Assets).join(name),
            )]
        }
    }
}
