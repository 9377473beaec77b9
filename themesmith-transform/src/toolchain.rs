//! Style compilation and minification behind small traits.
//!
//! The default collaborators wrap `grass` (SCSS) and `minifier` (JS and
//! CSS). Tests and embedders can swap any of them through
//! [`Toolchain::with_style_compiler`] and friends.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use themesmith_core::ThemeConfig;

use crate::error::TransformError;

/// Compiles style-authoring syntax into plain CSS.
pub trait StyleCompiler: Send + Sync {
    /// `load_dir` is used to resolve `@import`/`@use` of sibling files.
    fn compile(
        &self,
        name: &str,
        source: &str,
        load_dir: Option<&Path>,
    ) -> Result<String, TransformError>;
}

/// Shrinks a script or style sheet.
pub trait Minifier: Send + Sync {
    fn minify(&self, name: &str, source: &str) -> Result<String, TransformError>;
}

/// [`StyleCompiler`] backed by `grass`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassCompiler;

impl StyleCompiler for GrassCompiler {
    fn compile(
        &self,
        name: &str,
        source: &str,
        load_dir: Option<&Path>,
    ) -> Result<String, TransformError> {
        let mut options = grass::Options::default();
        if let Some(dir) = load_dir {
            options = options.load_path(dir);
        }
        grass::from_string(source.to_owned(), &options).map_err(|err| TransformError::Compile {
            name: name.to_string(),
            message: err.to_string(),
        })
    }
}

/// JS [`Minifier`] backed by `minifier::js`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinifier;

impl Minifier for JsMinifier {
    fn minify(&self, _name: &str, source: &str) -> Result<String, TransformError> {
        Ok(minifier::js::minify(source).to_string())
    }
}

/// CSS [`Minifier`] backed by `minifier::css`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinifier;

impl Minifier for CssMinifier {
    fn minify(&self, name: &str, source: &str) -> Result<String, TransformError> {
        minifier::css::minify(source)
            .map(|m| m.to_string())
            .map_err(|message| TransformError::Minify {
                name: name.to_string(),
                message: message.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Script ignore list
// ---------------------------------------------------------------------------

/// Script names excluded from minification.
///
/// Plain entries match the whole file name; entries starting with `-` match
/// as a suffix (`-min.js` matches `slider-min.js`). Glob syntax is accepted
/// as-is.
#[derive(Debug, Clone)]
pub struct ScriptIgnore {
    set: GlobSet,
}

impl ScriptIgnore {
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self, TransformError> {
        let mut builder = GlobSetBuilder::new();
        for entry in entries {
            let entry = entry.as_ref();
            let pattern = if entry.starts_with('-') {
                format!("*{entry}")
            } else {
                entry.to_string()
            };
            let glob = Glob::new(&pattern).map_err(|source| TransformError::Pattern {
                pattern: entry.to_string(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| TransformError::Pattern {
            pattern: entries
                .iter()
                .map(|e| e.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;
        Ok(Self { set })
    }

    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.set.is_match(file_name)
    }
}

// ---------------------------------------------------------------------------
// Toolchain
// ---------------------------------------------------------------------------

/// Bundles the collaborators and the minification switches for one run.
pub struct Toolchain {
    style: Box<dyn StyleCompiler>,
    js: Box<dyn Minifier>,
    css: Box<dyn Minifier>,
    ignore: ScriptIgnore,
    minimize_js: bool,
    minimize_css: bool,
}

impl Toolchain {
    /// Default collaborators, switches and ignore list taken from `config`.
    pub fn from_config(config: &ThemeConfig) -> Result<Self, TransformError> {
        Ok(Self {
            style: Box::new(GrassCompiler),
            js: Box::new(JsMinifier),
            css: Box::new(CssMinifier),
            ignore: ScriptIgnore::new(&config.script_ignore)?,
            minimize_js: config.minimize_js,
            minimize_css: config.minimize_css,
        })
    }

    pub fn with_style_compiler(mut self, compiler: impl StyleCompiler + 'static) -> Self {
        self.style = Box::new(compiler);
        self
    }

    pub fn with_js_minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.js = Box::new(minifier);
        self
    }

    pub fn with_css_minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.css = Box::new(minifier);
        self
    }

    /// Script output bytes. Untouched when minification is off, the name is
    /// ignored, or the file is not UTF-8.
    pub fn script(&self, name: &str, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        if !self.minimize_js || self.ignore.is_ignored(name) {
            return Ok(bytes.to_vec());
        }
        let Ok(source) = std::str::from_utf8(bytes) else {
            tracing::warn!(file = name, "script is not UTF-8; copying unminified");
            return Ok(bytes.to_vec());
        };
        tracing::debug!(file = name, "minifying script");
        Ok(self.js.minify(name, source)?.into_bytes())
    }

    /// Compile a (possibly merged) style source, then optionally minify.
    pub fn style(
        &self,
        output_name: &str,
        source: &str,
        load_dir: Option<&Path>,
    ) -> Result<String, TransformError> {
        let compiled = self.style.compile(output_name, source, load_dir)?;
        if self.minimize_css {
            return self.css.minify(output_name, &compiled);
        }
        Ok(compiled)
    }

    pub fn minimize_js(&self) -> bool {
        self.minimize_js
    }

    pub fn minimize_css(&self) -> bool {
        self.minimize_css
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("minimize_js", &self.minimize_js)
            .field("minimize_css", &self.minimize_css)
            .finish_non_exhaustive()
    }
}
