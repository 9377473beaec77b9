//! Asset classification: [`AssetKind`] and [`StylePair`].
//!
//! # Name mapping
//!
//! | Input name          | Kind                              | Output name |
//! |---------------------|-----------------------------------|-------------|
//! | `cart.js`           | `Script`                          | `cart.js`   |
//! | `base.css`          | `Style`                           | `base.css`  |
//! | `section-hero.scss` | `Style`                           | `section-hero.css` |
//! | `base.custom.scss`  | `StyleOverride { base: base.css }`| `base.css`  |
//! | `_mixins.scss`      | `Partial`                         | none        |
//! | `logo.svg`          | `Verbatim`                        | `logo.svg`  |
//!
//! A file is classified once; every task dispatches on the resulting variant.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, TransformError};

pub const OVERRIDE_STYLE_SUFFIX: &str = ".custom.scss";

/// Closed set of asset transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// Optionally minified, extension kept.
    Script,
    /// Compiled alone unless it is the base of a [`StylePair`].
    Style,
    /// Custom override source, merged after its base file.
    StyleOverride { base: String },
    /// `_name.scss`: only reachable through `@import`, never emitted.
    Partial,
    /// Copied byte-for-byte.
    Verbatim,
}

impl AssetKind {
    /// Classify a file by name alone.
    pub fn classify(file_name: &str) -> Self {
        if file_name.starts_with('_') && file_name.ends_with(".scss") {
            return AssetKind::Partial;
        }
        if let Some(stem) = file_name.strip_suffix(OVERRIDE_STYLE_SUFFIX) {
            if !stem.is_empty() {
                return AssetKind::StyleOverride {
                    base: format!("{stem}.css"),
                };
            }
        }
        match extension(file_name) {
            Some("js") => AssetKind::Script,
            Some("css") | Some("scss") => AssetKind::Style,
            _ => AssetKind::Verbatim,
        }
    }

    pub fn is_style(&self) -> bool {
        matches!(self, AssetKind::Style | AssetKind::StyleOverride { .. })
    }

    /// Name of the file this asset produces in the output directory.
    pub fn output_name(&self, file_name: &str) -> String {
        match self {
            AssetKind::StyleOverride { base } => base.clone(),
            AssetKind::Style => match file_name.strip_suffix(".scss") {
                Some(stem) => format!("{stem}.css"),
                None => file_name.to_string(),
            },
            AssetKind::Script | AssetKind::Verbatim | AssetKind::Partial => {
                file_name.to_string()
            }
        }
    }
}

fn extension(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|e| e.to_str())
}

/// Override source name for a base style (`X.css` → `X.custom.scss`).
pub fn override_name_for(base_name: &str) -> Option<String> {
    base_name
        .strip_suffix(".css")
        .filter(|stem| !stem.is_empty())
        .map(|stem| format!("{stem}{OVERRIDE_STYLE_SUFFIX}"))
}

// ---------------------------------------------------------------------------
// Style pairs
// ---------------------------------------------------------------------------

/// A style file and its optional same-named custom override source.
///
/// At least one side is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePair {
    pub base: Option<PathBuf>,
    pub override_source: Option<PathBuf>,
    pub output_name: String,
}

impl StylePair {
    /// Resolve the pair that `file_name` inside `dir` belongs to.
    ///
    /// - `X.custom.scss` pairs with `X.css` if that file exists.
    /// - `X.css` pairs with `X.custom.scss` if that file exists.
    /// - any other style compiles alone.
    ///
    /// Returns `None` for non-style names.
    pub fn resolve(dir: &Path, file_name: &str) -> Option<StylePair> {
        let kind = AssetKind::classify(file_name);
        let output_name = kind.output_name(file_name);
        match kind {
            AssetKind::StyleOverride { base } => {
                let base_path = dir.join(&base);
                Some(StylePair {
                    base: base_path.is_file().then_some(base_path),
                    override_source: Some(dir.join(file_name)),
                    output_name,
                })
            }
            AssetKind::Style => {
                let override_source = override_name_for(file_name)
                    .map(|name| dir.join(name))
                    .filter(|p| p.is_file());
                Some(StylePair {
                    base: Some(dir.join(file_name)),
                    override_source,
                    output_name,
                })
            }
            AssetKind::Script | AssetKind::Verbatim | AssetKind::Partial => None,
        }
    }

    /// Group every top-level style name in `names` into pairs.
    ///
    /// A base that has an override source appears only inside its pair, never
    /// on its own. Pairs are returned sorted by output name.
    pub fn collect(dir: &Path, names: &[String]) -> Vec<StylePair> {
        let mut pairs: Vec<StylePair> = Vec::new();
        for name in names {
            let kind = AssetKind::classify(name);
            if !kind.is_style() {
                continue;
            }
            if let AssetKind::Style = kind {
                let paired = override_name_for(name)
                    .map(|o| names.contains(&o))
                    .unwrap_or(false);
                if paired {
                    continue;
                }
            }
            let override_source = match &kind {
                AssetKind::StyleOverride { .. } => Some(dir.join(name)),
                _ => None,
            };
            let base = match &kind {
                AssetKind::StyleOverride { base } => {
                    names.contains(base).then(|| dir.join(base))
                }
                _ => Some(dir.join(name)),
            };
            pairs.push(StylePair {
                base,
                override_source,
                output_name: kind.output_name(name),
            });
        }
        pairs.sort_by(|a, b| a.output_name.cmp(&b.output_name));
        pairs
    }

    pub fn is_merged(&self) -> bool {
        self.base.is_some() && self.override_source.is_some()
    }

    /// Files read to build this pair, base first.
    pub fn inputs(&self) -> impl Iterator<Item = &Path> {
        self.base
            .iter()
            .chain(self.override_source.iter())
            .map(PathBuf::as_path)
    }

    /// Base content followed by override content, joined by a newline.
    ///
    /// A side that vanished since resolution is skipped.
    pub fn merged_source(&self) -> Result<String, TransformError> {
        let mut parts = Vec::new();
        for path in self.inputs() {
            match std::fs::read(path) {
                Ok(bytes) => {
                    let text = String::from_utf8(bytes).map_err(|_| TransformError::NotUtf8 {
                        path: path.to_path_buf(),
                    })?;
                    parts.push(text);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(io_err(path, err)),
            }
        }
        Ok(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case("cart.js", AssetKind::Script, "cart.js")]
    #[case("base.css", AssetKind::Style, "base.css")]
    #[case("section-hero.scss", AssetKind::Style, "section-hero.css")]
    #[case("base.custom.scss", AssetKind::StyleOverride { base: "base.css".into() }, "base.css")]
    #[case("logo.svg", AssetKind::Verbatim, "logo.svg")]
    #[case("theme.css.liquid", AssetKind::Verbatim, "theme.css.liquid")]
    #[case("_vars.scss", AssetKind::Partial, "_vars.scss")]
    fn classification(#[case] name: &str, #[case] kind: AssetKind, #[case] output: &str) {
        let classified = AssetKind::classify(name);
        assert_eq!(classified, kind);
        assert_eq!(classified.output_name(name), output);
    }

    #[test]
    fn bare_custom_suffix_is_not_an_override() {
        assert_eq!(AssetKind::classify(".custom.scss"), AssetKind::Style);
    }

    #[test]
    fn resolve_override_finds_base() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.css"), ".a{}").unwrap();
        fs::write(dir.path().join("base.custom.scss"), ".b{}").unwrap();

        let pair = StylePair::resolve(dir.path(), "base.custom.scss").unwrap();
        assert!(pair.is_merged());
        assert_eq!(pair.output_name, "base.css");

        let from_base = StylePair::resolve(dir.path(), "base.css").unwrap();
        assert_eq!(from_base, pair);
    }

    #[test]
    fn resolve_override_without_base_compiles_override_alone() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("orphan.custom.scss"), ".b{}").unwrap();
        let pair = StylePair::resolve(dir.path(), "orphan.custom.scss").unwrap();
        assert!(pair.base.is_none());
        assert_eq!(pair.output_name, "orphan.css");
    }

    #[test]
    fn resolve_ignores_non_styles() {
        assert!(StylePair::resolve(Path::new("/x"), "cart.js").is_none());
    }

    #[test]
    fn collect_does_not_compile_paired_base_alone() {
        let names: Vec<String> = ["a.css", "a.custom.scss", "b.css", "c.scss", "d.js"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pairs = StylePair::collect(Path::new("/assets"), &names);
        let outputs: Vec<&str> = pairs.iter().map(|p| p.output_name.as_str()).collect();
        assert_eq!(outputs, vec!["a.css", "b.css", "c.css"]);
        assert!(pairs[0].is_merged());
        assert!(!pairs[1].is_merged());
    }

    #[test]
    fn merged_source_is_base_then_override_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.css"), ".base { color: red; }").unwrap();
        fs::write(dir.path().join("x.custom.scss"), ".over { color: blue; }").unwrap();
        let pair = StylePair::resolve(dir.path(), "x.custom.scss").unwrap();

        let merged = pair.merged_source().unwrap();
        assert_eq!(merged, ".base { color: red; }\n.over { color: blue; }");
    }

    #[test]
    fn partials_never_form_pairs() {
        let names: Vec<String> = ["_vars.scss", "theme.scss"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pairs = StylePair::collect(Path::new("/assets"), &names);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].output_name, "theme.css");
        assert!(StylePair::resolve(Path::new("/assets"), "_vars.scss").is_none());
    }
}
