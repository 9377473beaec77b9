//! `themesmith scaffold`: create `stores/<STORE>/` for the configured store.

use anyhow::{Context, Result};

use themesmith_core::ThemeConfig;

use super::display_path;

pub fn run(config: &ThemeConfig) -> Result<()> {
    let layout = config.layout();
    let created = layout
        .scaffold_store()
        .context("failed to scaffold override tree")?;

    if created.is_empty() {
        println!("override tree already complete");
        return Ok(());
    }
    for dir in created {
        println!("created {}", display_path(layout.root(), &dir));
    }
    Ok(())
}
