//! Path registry: maps every [`FileGroup`] to its directory in each tree.
//!
//! # Project layout
//!
//! ```text
//! <root>/
//!   src/<group>/            generic source tree
//!   stores/<STORE>/<group>/ per-environment override tree
//!   dist/<group>/           build output
//!   download/<group>/       remote snapshot used by reconciliation
//!   concat/assets/          staged style-pair sources
//! ```
//!
//! Every listing helper treats a missing directory as empty.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, LayoutError};
use crate::types::{FileGroup, StoreName, Tree};

/// Override-tree directories created by [`ThemeLayout::scaffold_store`].
///
/// `templates` is created implicitly as the parent of `templates/customers`.
pub const SCAFFOLD_GROUPS: &[FileGroup] = &[
    FileGroup::Config,
    FileGroup::Layout,
    FileGroup::Locales,
    FileGroup::TemplatesCustomers,
    FileGroup::Sections,
];

/// Resolved directory layout for one theme project and (optionally) one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLayout {
    root: PathBuf,
    store: Option<StoreName>,
}

impl ThemeLayout {
    pub fn new(root: impl Into<PathBuf>, store: Option<StoreName>) -> Self {
        Self {
            root: root.into(),
            store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> Option<&StoreName> {
        self.store.as_ref()
    }

    /// Root directory of a tree. `None` for [`Tree::Store`] unless the store
    /// accepts overrides.
    pub fn tree_dir(&self, tree: Tree) -> Option<PathBuf> {
        match tree {
            Tree::Source => Some(self.root.join("src")),
            Tree::Store => self
                .store
                .as_ref()
                .filter(|store| store.accepts_overrides())
                .map(|store| self.root.join("stores").join(&store.0)),
            Tree::Dist => Some(self.root.join("dist")),
            Tree::Download => Some(self.root.join("download")),
            Tree::Concat => Some(self.root.join("concat")),
        }
    }

    /// Directory of `group` inside `tree`.
    pub fn group_dir(&self, tree: Tree, group: FileGroup) -> Option<PathBuf> {
        self.tree_dir(tree).map(|dir| dir.join(group.rel_dir()))
    }

    pub fn source_dir(&self, group: FileGroup) -> PathBuf {
        self.root.join("src").join(group.rel_dir())
    }

    /// Override directory of `group`; `None` for an empty or `development` store.
    pub fn store_dir(&self, group: FileGroup) -> Option<PathBuf> {
        self.group_dir(Tree::Store, group)
    }

    pub fn dist_dir(&self, group: FileGroup) -> PathBuf {
        self.root.join("dist").join(group.rel_dir())
    }

    pub fn download_dir(&self, group: FileGroup) -> PathBuf {
        self.root.join("download").join(group.rel_dir())
    }

    /// Locate the tree and group a path belongs to.
    ///
    /// `templates/customers` wins over `templates` for nested paths. Returns
    /// `None` for paths outside the known group directories.
    pub fn classify(&self, path: &Path) -> Option<(Tree, FileGroup)> {
        let trees = [Tree::Source, Tree::Store, Tree::Dist, Tree::Download];
        for tree in trees {
            let Some(tree_dir) = self.tree_dir(tree) else {
                continue;
            };
            let Ok(rel) = path.strip_prefix(&tree_dir) else {
                continue;
            };
            // Longest directory match first.
            let mut groups: Vec<FileGroup> = FileGroup::all().to_vec();
            groups.sort_by_key(|g| std::cmp::Reverse(g.rel_dir().len()));
            for group in groups {
                if rel.starts_with(group.rel_dir()) {
                    return Some((tree, group));
                }
            }
        }
        None
    }

    /// Create the override subtree for the configured store.
    ///
    /// Idempotent. Returns the directories that did not exist before.
    pub fn scaffold_store(&self) -> Result<Vec<PathBuf>, LayoutError> {
        let store = self.store.as_ref().ok_or(LayoutError::StoreRequired)?;
        if !store.accepts_overrides() {
            return Err(LayoutError::StoreWithoutOverrides {
                store: store.0.clone(),
            });
        }

        let mut created = Vec::new();
        for group in SCAFFOLD_GROUPS {
            let Some(dir) = self.store_dir(*group) else {
                continue;
            };
            if dir.is_dir() {
                continue;
            }
            std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
            tracing::info!(path = %dir.display(), "created override directory");
            created.push(dir);
        }
        Ok(created)
    }
}

// ---------------------------------------------------------------------------
// Listing helpers
// ---------------------------------------------------------------------------

/// Regular files inside `dir`, sorted by path.
///
/// With `recursive`, nested directories are walked too. A missing directory
/// yields an empty list.
pub fn list_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, LayoutError> {
    let mut out = Vec::new();
    collect_files(dir, recursive, &mut out)?;
    out.sort();
    Ok(out)
}

/// File names (not paths) of the regular files directly inside `dir`.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>, LayoutError> {
    Ok(list_files(dir, false)?
        .into_iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect())
}

fn collect_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), LayoutError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_err(dir, err)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let ty = entry.file_type().map_err(|e| io_err(&path, e))?;
        if ty.is_dir() {
            if recursive {
                collect_files(&path, recursive, out)?;
            }
        } else if ty.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout(root: &Path) -> ThemeLayout {
        ThemeLayout::new(root, Some(StoreName::from("uk")))
    }

    #[test]
    fn group_dirs_are_correct() {
        let root = TempDir::new().unwrap();
        let l = layout(root.path());
        assert!(l
            .source_dir(FileGroup::TemplatesCustomers)
            .ends_with("src/templates/customers"));
        assert!(l
            .store_dir(FileGroup::Config)
            .unwrap()
            .ends_with("stores/uk/config"));
        assert!(l.dist_dir(FileGroup::Assets).ends_with("dist/assets"));
        assert!(l.download_dir(FileGroup::Locales).ends_with("download/locales"));
    }

    #[test]
    fn store_tree_absent_without_store() {
        let l = ThemeLayout::new("/theme", None);
        assert!(l.tree_dir(Tree::Store).is_none());
        assert!(l.store_dir(FileGroup::Config).is_none());
    }

    #[test]
    fn classify_prefers_nested_group() {
        let l = layout(Path::new("/theme"));
        assert_eq!(
            l.classify(Path::new("/theme/src/templates/customers/login.json")),
            Some((Tree::Source, FileGroup::TemplatesCustomers))
        );
        assert_eq!(
            l.classify(Path::new("/theme/src/templates/index.json")),
            Some((Tree::Source, FileGroup::Templates))
        );
        assert_eq!(
            l.classify(Path::new("/theme/stores/uk/config/settings_data.json")),
            Some((Tree::Store, FileGroup::Config))
        );
        assert_eq!(l.classify(Path::new("/theme/README.md")), None);
    }

    #[test]
    fn missing_dir_lists_empty() {
        let root = TempDir::new().unwrap();
        let files = list_files(&root.path().join("nope"), true).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn non_recursive_listing_skips_subdirectories() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("templates");
        fs::create_dir_all(dir.join("customers")).unwrap();
        fs::write(dir.join("index.json"), "{}").unwrap();
        fs::write(dir.join("customers").join("login.json"), "{}").unwrap();

        let names = list_file_names(&dir).unwrap();
        assert_eq!(names, vec!["index.json".to_string()]);

        let all = list_files(&dir, true).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn scaffold_creates_override_dirs_once() {
        let root = TempDir::new().unwrap();
        let l = layout(root.path());
        let created = l.scaffold_store().expect("scaffold");
        assert_eq!(created.len(), SCAFFOLD_GROUPS.len());
        assert!(root.path().join("stores/uk/templates/customers").is_dir());
        assert!(root.path().join("stores/uk/sections").is_dir());

        let again = l.scaffold_store().expect("scaffold again");
        assert!(again.is_empty());
    }

    #[test]
    fn scaffold_refuses_development() {
        let root = TempDir::new().unwrap();
        let l = ThemeLayout::new(root.path(), Some(StoreName::from("development")));
        let err = l.scaffold_store().unwrap_err();
        assert!(matches!(err, LayoutError::StoreWithoutOverrides { .. }));
        assert!(!root.path().join("stores").exists());
    }

    #[test]
    fn scaffold_requires_store() {
        let root = TempDir::new().unwrap();
        let l = ThemeLayout::new(root.path(), None);
        assert!(matches!(
            l.scaffold_store().unwrap_err(),
            LayoutError::StoreRequired
        ));
    }

    #[test]
    fn development_store_has_no_override_dirs() {
        let l = ThemeLayout::new("/theme", Some(StoreName::from("development")));
        assert_eq!(l.tree_dir(Tree::Store), None);
        assert_eq!(l.store_dir(FileGroup::Config), None);
        assert_eq!(
            l.classify(Path::new("/theme/stores/development/config/settings_data.json")),
            None
        );
    }
}
