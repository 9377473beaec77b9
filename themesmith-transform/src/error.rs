//! Error types for themesmith-transform.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while transforming an asset.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The style compiler rejected the (possibly merged) source.
    #[error("failed to compile {name}: {message}")]
    Compile { name: String, message: String },

    /// A minifier rejected its input.
    #[error("failed to minify {name}: {message}")]
    Minify { name: String, message: String },

    /// Style and script sources must be UTF-8.
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    /// Reading a style-pair source failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A script ignore pattern could not be compiled.
    #[error("invalid script ignore pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TransformError {
    TransformError::Io {
        path: path.into(),
        source,
    }
}
