//! Themesmith core library: file groups, path registry, configuration,
//! manifests.
//!
//! - [`types`]: [`FileGroup`], [`StoreName`], [`Tree`]
//! - [`layout`]: [`ThemeLayout`], the static path registry
//! - [`config`]: [`ThemeConfig`], built once per process
//! - [`manifest`]: [`Manifest`], the value type reconciliation diffs over
//! - [`error`]: [`LayoutError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod types;

pub use config::{ConfigOverrides, ConfigSources, ThemeConfig};
pub use error::{ConfigError, LayoutError};
pub use layout::{list_file_names, list_files, ThemeLayout};
pub use manifest::Manifest;
pub use types::{FileGroup, StoreName, Tree};
