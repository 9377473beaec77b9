//! Error types for themesmith-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving the path registry or walking its trees.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An operation needed the override tree but no usable store is configured.
    #[error("no store configured; set STORE in .env or pass --store <name>")]
    StoreRequired,

    /// The configured store cannot carry an override tree (empty or `development`).
    #[error("store '{store}' does not use an override tree")]
    StoreWithoutOverrides { store: String },
}

/// Errors raised while building a [`crate::config::ThemeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a configuration source failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error in `themesmith.yaml`, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The `.env` file is malformed.
    #[error("failed to read environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// A configuration value could not be interpreted.
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LayoutError {
    LayoutError::Io {
        path: path.into(),
        source,
    }
}
