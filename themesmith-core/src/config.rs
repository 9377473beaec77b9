//! Process-wide configuration, resolved once at startup.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `themesmith.yaml` in the project root (optional)
//! 3. the environment snapshot: `.env` overlaid by real process variables
//! 4. [`ConfigOverrides`] from the command line
//!
//! Nothing downstream reads the process environment again; tasks receive a
//! `&ThemeConfig`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::layout::ThemeLayout;
use crate::types::StoreName;

pub const CONFIG_FILE: &str = "themesmith.yaml";
pub const ENV_FILE: &str = ".env";

pub const ENV_STORE: &str = "STORE";
pub const ENV_MINIMIZE_JS: &str = "MINIMIZE_JS";
pub const ENV_MINIMIZE_CSS: &str = "MINIMIZE_CSS";
pub const ENV_THEME_CLI: &str = "THEME_CLI";

/// Scripts that are already minified upstream and are copied untouched.
pub const DEFAULT_SCRIPT_IGNORE: &[&str] = &[
    "predictive-search.js",
    "global.js",
    "customer.js",
    "color-swatches.js",
    "cart.js",
    "vendor-v4.js",
    "-min.js",
];

/// Download config files kept by the full-reconciliation prune step.
pub const DEFAULT_PROTECTED_CONFIG: &[&str] = &["settings_data.json", "settings_schema.json"];

pub const DEFAULT_LOCALE_PRUNE_PREFIX: &str = "en_";
pub const DEFAULT_THEME_CLI: &str = "theme";
pub const DEFAULT_IGNORE_FILE: &str = ".theme_ignores";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Fully-resolved configuration handed to every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub root: PathBuf,
    pub store: Option<StoreName>,
    pub minimize_js: bool,
    pub minimize_css: bool,
    pub script_ignore: Vec<String>,
    pub protected_config: Vec<String>,
    pub locale_prune_prefix: String,
    pub theme_cli: String,
    /// Relative to `root` unless absolute.
    pub ignore_file: PathBuf,
    /// `Some` switches the watcher to polling at this interval.
    pub poll_interval: Option<Duration>,
    pub debounce: Duration,
}

impl ThemeConfig {
    /// Defaults for a project rooted at `root`.
    pub fn defaults(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store: None,
            minimize_js: false,
            minimize_css: false,
            script_ignore: DEFAULT_SCRIPT_IGNORE.iter().map(|s| s.to_string()).collect(),
            protected_config: DEFAULT_PROTECTED_CONFIG
                .iter()
                .map(|s| s.to_string())
                .collect(),
            locale_prune_prefix: DEFAULT_LOCALE_PRUNE_PREFIX.to_string(),
            theme_cli: DEFAULT_THEME_CLI.to_string(),
            ignore_file: PathBuf::from(DEFAULT_IGNORE_FILE),
            poll_interval: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Load every source from disk and the process environment.
    pub fn load(
        root: &Path,
        sources: &ConfigSources,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let file_path = sources
            .config_file
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE));
        let file = FileConfig::load(&file_path, sources.config_file.is_some())?;

        let env_path = sources
            .env_file
            .clone()
            .unwrap_or_else(|| root.join(ENV_FILE));
        let mut env = EnvSnapshot::from_file(&env_path, sources.env_file.is_some())?;
        env.overlay(std::env::vars());

        let config = Self::resolve(root, file.as_ref(), &env, overrides)?;
        tracing::debug!(
            root = %config.root.display(),
            store = ?config.store,
            minimize_js = config.minimize_js,
            minimize_css = config.minimize_css,
            "configuration resolved",
        );
        Ok(config)
    }

    /// Pure layering of already-read sources.
    pub fn resolve(
        root: &Path,
        file: Option<&FileConfig>,
        env: &EnvSnapshot,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::defaults(root);

        if let Some(file) = file {
            file.apply(&mut config)?;
        }

        if let Some(store) = env.get(ENV_STORE).filter(|s| !s.trim().is_empty()) {
            config.store = Some(StoreName::from(store));
        }
        if let Some(value) = env.get(ENV_MINIMIZE_JS) {
            config.minimize_js = env_flag(value);
        }
        if let Some(value) = env.get(ENV_MINIMIZE_CSS) {
            config.minimize_css = env_flag(value);
        }
        if let Some(cli) = env.get(ENV_THEME_CLI).filter(|s| !s.trim().is_empty()) {
            config.theme_cli = cli.to_string();
        }

        if let Some(store) = &overrides.store {
            config.store = Some(store.clone());
        }
        if overrides.minimize_js {
            config.minimize_js = true;
        }
        if overrides.minimize_css {
            config.minimize_css = true;
        }

        Ok(config)
    }

    pub fn layout(&self) -> ThemeLayout {
        ThemeLayout::new(self.root.clone(), self.store.clone())
    }

    /// Absolute path of the remote ignore-list file.
    pub fn ignore_file_path(&self) -> PathBuf {
        if self.ignore_file.is_absolute() {
            self.ignore_file.clone()
        } else {
            self.root.join(&self.ignore_file)
        }
    }
}

/// Minification switches are enabled only by the exact string `"true"`.
fn env_flag(value: &str) -> bool {
    value == "true"
}

/// Explicit paths for the on-disk sources; `None` means "use the default
/// file in the project root, if present".
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub config_file: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Command-line overrides (highest precedence).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store: Option<StoreName>,
    pub minimize_js: bool,
    pub minimize_css: bool,
}

// ---------------------------------------------------------------------------
// themesmith.yaml
// ---------------------------------------------------------------------------

/// Optional project file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub store: Option<String>,
    pub minimize_js: Option<bool>,
    pub minimize_css: Option<bool>,
    pub script_ignore: Option<Vec<String>>,
    pub protected_config: Option<Vec<String>>,
    pub locale_prune_prefix: Option<String>,
    pub theme_cli: Option<String>,
    pub ignore_file: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub debounce_ms: Option<u64>,
}

impl FileConfig {
    /// Read and parse `path`. A missing file is `Ok(None)` unless `required`.
    pub fn load(path: &Path, required: bool) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    fn apply(&self, config: &mut ThemeConfig) -> Result<(), ConfigError> {
        if let Some(store) = self.store.as_deref().filter(|s| !s.trim().is_empty()) {
            config.store = Some(StoreName::from(store));
        }
        if let Some(v) = self.minimize_js {
            config.minimize_js = v;
        }
        if let Some(v) = self.minimize_css {
            config.minimize_css = v;
        }
        if let Some(list) = &self.script_ignore {
            config.script_ignore = list.clone();
        }
        if let Some(list) = &self.protected_config {
            config.protected_config = list.clone();
        }
        if let Some(prefix) = &self.locale_prune_prefix {
            if prefix.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "locale_prune_prefix",
                    message: "an empty prefix would prune every locale".to_string(),
                });
            }
            config.locale_prune_prefix = prefix.clone();
        }
        if let Some(cli) = &self.theme_cli {
            config.theme_cli = cli.clone();
        }
        if let Some(file) = &self.ignore_file {
            config.ignore_file = file.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    key: "poll_interval_ms",
                    message: "must be greater than zero".to_string(),
                });
            }
            config.poll_interval = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Environment snapshot
// ---------------------------------------------------------------------------

/// Immutable copy of the environment variables the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Parse a `.env` file without touching the process environment.
    ///
    /// A missing file yields an empty snapshot unless `required`.
    pub fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if !path.exists() && !required {
            return Ok(Self::default());
        }
        let iter = dotenvy::from_path_iter(path).map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            vars.insert(key, value);
        }
        Ok(Self { vars })
    }

    /// Layer `vars` on top; later values win. Only the keys this crate reads
    /// are retained.
    pub fn overlay(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if is_known_key(&key) {
                self.vars.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        ENV_STORE | ENV_MINIMIZE_JS | ENV_MINIMIZE_CSS | ENV_THEME_CLI
    )
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
