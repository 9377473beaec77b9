//! Manifest: a value-typed listing of file names per [`FileGroup`].
//!
//! Reconciliation is expressed as set algebra over manifests; only
//! [`Manifest::scan`] touches the filesystem.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::LayoutError;
use crate::layout::{list_file_names, ThemeLayout};
use crate::types::{FileGroup, Tree};

/// Mapping of group to the set of file names it contains.
///
/// Empty groups are never stored, so two manifests with the same files
/// compare equal regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    groups: BTreeMap<FileGroup, BTreeSet<String>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from non-recursive listings of `tree`.
    ///
    /// Only files accepted by `keep` are recorded. A tree that does not exist
    /// (e.g. no store configured) yields an empty manifest.
    pub fn scan(
        layout: &ThemeLayout,
        tree: Tree,
        groups: &[FileGroup],
        keep: impl Fn(FileGroup, &str) -> bool,
    ) -> Result<Self, LayoutError> {
        let mut manifest = Self::new();
        for group in groups {
            let Some(dir) = layout.group_dir(tree, *group) else {
                continue;
            };
            for name in list_file_names(&dir)? {
                if keep(*group, &name) {
                    manifest.insert(*group, name);
                }
            }
        }
        Ok(manifest)
    }

    pub fn insert(&mut self, group: FileGroup, name: impl Into<String>) {
        self.groups.entry(group).or_default().insert(name.into());
    }

    pub fn contains(&self, group: FileGroup, name: &str) -> bool {
        self.groups
            .get(&group)
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }

    /// Names in `group`, sorted.
    pub fn files(&self, group: FileGroup) -> impl Iterator<Item = &str> {
        self.groups
            .get(&group)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn groups(&self) -> impl Iterator<Item = FileGroup> + '_ {
        self.groups.keys().copied()
    }

    /// Every `(group, name)` pair in group order.
    pub fn iter(&self) -> impl Iterator<Item = (FileGroup, &str)> {
        self.groups
            .iter()
            .flat_map(|(group, names)| names.iter().map(move |n| (*group, n.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    /// Entries present in both manifests.
    pub fn intersect(&self, other: &Manifest) -> Manifest {
        self.filter(|group, name| other.contains(group, name))
    }

    /// Entries of `self` not present in `other`.
    pub fn difference(&self, other: &Manifest) -> Manifest {
        self.filter(|group, name| !other.contains(group, name))
    }

    /// Entries of `self` whose group is in `groups`.
    pub fn restrict(&self, groups: &[FileGroup]) -> Manifest {
        self.filter(|group, _| groups.contains(&group))
    }

    pub fn filter(&self, keep: impl Fn(FileGroup, &str) -> bool) -> Manifest {
        let mut out = Manifest::new();
        for (group, name) in self.iter() {
            if keep(group, name) {
                out.insert(group, name);
            }
        }
        out
    }
}

impl<S: Into<String>> FromIterator<(FileGroup, S)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (FileGroup, S)>>(iter: T) -> Self {
        let mut manifest = Manifest::new();
        for (group, name) in iter {
            manifest.insert(group, name);
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoreName;
    use std::fs;
    use tempfile::TempDir;

    fn m(entries: &[(FileGroup, &str)]) -> Manifest {
        entries.iter().map(|(g, n)| (*g, *n)).collect()
    }

    #[test]
    fn intersect_and_difference() {
        let local = m(&[
            (FileGroup::Config, "settings_data.json"),
            (FileGroup::Locales, "fr.json"),
        ]);
        let remote = m(&[
            (FileGroup::Config, "settings_data.json"),
            (FileGroup::Config, "settings_schema.json"),
        ]);

        assert_eq!(
            local.intersect(&remote),
            m(&[(FileGroup::Config, "settings_data.json")])
        );
        assert_eq!(
            remote.difference(&local),
            m(&[(FileGroup::Config, "settings_schema.json")])
        );
    }

    #[test]
    fn empty_groups_are_not_stored() {
        let a = m(&[(FileGroup::Layout, "theme.liquid")]);
        let b = a.filter(|_, _| false);
        assert!(b.is_empty());
        assert_eq!(b, Manifest::new());
        assert_eq!(b.groups().count(), 0);
    }

    #[test]
    fn restrict_keeps_requested_groups() {
        let a = m(&[
            (FileGroup::Layout, "theme.liquid"),
            (FileGroup::Snippets, "card.liquid"),
        ]);
        let r = a.restrict(&[FileGroup::Snippets]);
        assert_eq!(r.len(), 1);
        assert!(r.contains(FileGroup::Snippets, "card.liquid"));
    }

    #[test]
    fn scan_lists_top_level_files() {
        let root = TempDir::new().unwrap();
        let layout = ThemeLayout::new(root.path(), Some(StoreName::from("uk")));
        let templates = root.path().join("download/templates");
        fs::create_dir_all(templates.join("customers")).unwrap();
        fs::write(templates.join("index.json"), "{}").unwrap();
        fs::write(templates.join("customers/login.json"), "{}").unwrap();

        let manifest = Manifest::scan(
            &layout,
            Tree::Download,
            &[FileGroup::Templates, FileGroup::TemplatesCustomers],
            |_, _| true,
        )
        .unwrap();
        assert!(manifest.contains(FileGroup::Templates, "index.json"));
        assert!(!manifest.contains(FileGroup::Templates, "customers"));
        assert!(manifest.contains(FileGroup::TemplatesCustomers, "login.json"));
    }

    #[test]
    fn scan_without_store_is_empty() {
        let root = TempDir::new().unwrap();
        let layout = ThemeLayout::new(root.path(), None);
        let manifest =
            Manifest::scan(&layout, Tree::Store, FileGroup::all(), |_, _| true).unwrap();
        assert!(manifest.is_empty());
    }
}
