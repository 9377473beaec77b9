//! `themesmith watch`: run in the foreground until ctrl-c.

use anyhow::{Context, Result};

use themesmith_core::ThemeConfig;
use themesmith_sync::BuildContext;

pub fn run(config: &ThemeConfig) -> Result<()> {
    let ctx = BuildContext::new(config, false).context("failed to set up build")?;
    tracing::info!(
        root = %config.root.display(),
        store = ?config.store,
        polling = config.poll_interval.is_some(),
        "starting watch; press ctrl-c to stop"
    );
    themesmith_watch::start_blocking(ctx).context("watch exited with error")
}
