//! Domain types for the theme path registry.
//!
//! Group membership is decided by directory and file name only; nothing in
//! this module ever looks at file contents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed deployment environment name (the `STORE` variable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreName(pub String);

impl StoreName {
    /// Environment name that conventionally carries no override tree.
    pub const DEVELOPMENT: &'static str = "development";

    /// `true` when the name is usable for an override tree.
    pub fn accepts_overrides(&self) -> bool {
        !self.0.trim().is_empty() && self.0 != Self::DEVELOPMENT
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for StoreName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StoreName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// File groups
// ---------------------------------------------------------------------------

/// A named category of theme files sharing a directory role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileGroup {
    Assets,
    Config,
    Layout,
    Locales,
    Sections,
    Snippets,
    Templates,
    TemplatesCustomers,
}

impl FileGroup {
    /// Every group, in registry order.
    pub fn all() -> &'static [FileGroup] {
        &[
            FileGroup::Assets,
            FileGroup::Config,
            FileGroup::Layout,
            FileGroup::Locales,
            FileGroup::Sections,
            FileGroup::Snippets,
            FileGroup::Templates,
            FileGroup::TemplatesCustomers,
        ]
    }

    /// Groups that have a store-specific flavor in the override tree.
    pub fn with_store_overrides() -> impl Iterator<Item = FileGroup> {
        Self::all().iter().copied().filter(|g| g.has_store_overrides())
    }

    /// Directory of this group relative to any tree root.
    pub fn rel_dir(&self) -> &'static str {
        match self {
            FileGroup::Assets => "assets",
            FileGroup::Config => "config",
            FileGroup::Layout => "layout",
            FileGroup::Locales => "locales",
            FileGroup::Sections => "sections",
            FileGroup::Snippets => "snippets",
            FileGroup::Templates => "templates",
            FileGroup::TemplatesCustomers => "templates/customers",
        }
    }

    /// Task label used on the command line (`templates:customers`).
    pub fn label(&self) -> &'static str {
        match self {
            FileGroup::TemplatesCustomers => "templates:customers",
            other => other.rel_dir(),
        }
    }

    /// Whether the build walks nested directories and flattens them into the
    /// output directory. Other groups copy top-level files only.
    pub fn flattens(&self) -> bool {
        matches!(
            self,
            FileGroup::Assets | FileGroup::Layout | FileGroup::Sections | FileGroup::Snippets
        )
    }

    /// Whether the override tree may hold files for this group.
    pub fn has_store_overrides(&self) -> bool {
        !matches!(self, FileGroup::Assets | FileGroup::Snippets)
    }

    /// Whether an override-tree file takes part in store reconciliation.
    ///
    /// Sections only reconcile their JSON section groups.
    pub fn reconciles_store_file(&self, name: &str) -> bool {
        match self {
            FileGroup::Sections => name.ends_with(".json"),
            _ => true,
        }
    }

    /// Whether a snapshot file is promoted into the source tree by the
    /// generic sweep (`<group>/*.*`, assets without scripts and styles).
    pub fn sweeps_remote_file(&self, name: &str) -> bool {
        if name.starts_with('.') || !name.contains('.') {
            return false;
        }
        match self {
            FileGroup::Assets => !(name.ends_with(".js") || name.ends_with(".css")),
            _ => true,
        }
    }
}

impl fmt::Display for FileGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['/', '_'], ":");
        FileGroup::all()
            .iter()
            .copied()
            .find(|g| g.label() == normalized)
            .ok_or_else(|| {
                let labels: Vec<&str> = FileGroup::all().iter().map(|g| g.label()).collect();
                format!("unknown file group '{s}'; expected one of: {}", labels.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Trees
// ---------------------------------------------------------------------------

/// One of the fixed top-level directories of a theme project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tree {
    /// `src/`: the generic source tree.
    Source,
    /// `stores/<STORE>/`: the per-environment override tree.
    Store,
    /// `dist/`: build output.
    Dist,
    /// `download/`: transient remote snapshot.
    Download,
    /// `concat/`: staged style-pair sources.
    Concat,
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Source => write!(f, "source"),
            Tree::Store => write!(f, "store"),
            Tree::Dist => write!(f, "dist"),
            Tree::Download => write!(f, "download"),
            Tree::Concat => write!(f, "concat"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
