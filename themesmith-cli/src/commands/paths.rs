//! `themesmith paths`: print the path registry for the resolved configuration.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use themesmith_core::{FileGroup, ThemeConfig, Tree};

use super::{display_path, print_json};

/// Arguments for `themesmith paths`.
#[derive(Args, Debug)]
pub struct PathsArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PathsJson {
    root: String,
    store: Option<String>,
    groups: Vec<GroupRow>,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct GroupRow {
    #[tabled(rename = "group")]
    group: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "store")]
    store: String,
    #[tabled(rename = "dist")]
    dist: String,
    #[tabled(rename = "download")]
    download: String,
}

impl PathsArgs {
    pub fn run(self, config: &ThemeConfig) -> Result<()> {
        let layout = config.layout();
        let root = layout.root();
        let rel = |tree: Tree, group: FileGroup| {
            layout
                .group_dir(tree, group)
                .map(|dir| display_path(root, &dir))
                .unwrap_or_else(|| "-".to_string())
        };

        let rows: Vec<GroupRow> = FileGroup::all()
            .iter()
            .map(|group| GroupRow {
                group: group.label().to_string(),
                source: rel(Tree::Source, *group),
                store: if group.has_store_overrides() {
                    rel(Tree::Store, *group)
                } else {
                    "-".to_string()
                },
                dist: rel(Tree::Dist, *group),
                download: rel(Tree::Download, *group),
            })
            .collect();

        if self.json {
            return print_json(&PathsJson {
                root: root.display().to_string(),
                store: layout.store().map(|s| s.0.clone()),
                groups: rows,
            });
        }

        let store = match layout.store() {
            Some(store) if store.accepts_overrides() => store.0.clone(),
            Some(store) => format!("{} (no overrides)", store.0),
            None => "<none>".to_string(),
        };
        println!(
            "Themesmith v{} | root {} | store {}",
            env!("CARGO_PKG_VERSION"),
            root.display(),
            store.bold()
        );
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
