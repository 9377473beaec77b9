//! # themesmith-transform
//!
//! Per-file transforms for theme assets: classification into an
//! [`AssetKind`], style-pair resolution, SCSS compilation and minification.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use themesmith_core::ThemeConfig;
//! use themesmith_transform::{StylePair, Toolchain};
//!
//! fn compile(config: &ThemeConfig, assets: &Path) {
//!     let Ok(toolchain) = Toolchain::from_config(config) else { return };
//!     if let Some(pair) = StylePair::resolve(assets, "base.custom.scss") {
//!         if let Ok(source) = pair.merged_source() {
//!             let _ = toolchain.style(&pair.output_name, &source, Some(assets));
//!         }
//!     }
//! }
//! ```

pub mod error;
pub mod kind;
pub mod toolchain;

pub use error::TransformError;
pub use kind::{override_name_for, AssetKind, StylePair, OVERRIDE_STYLE_SUFFIX};
pub use toolchain::{
    CssMinifier, GrassCompiler, JsMinifier, Minifier, ScriptIgnore, StyleCompiler, Toolchain,
};
