//! Error types for themesmith-sync.

use std::path::PathBuf;

use thiserror::Error;

use themesmith_core::LayoutError;
use themesmith_transform::TransformError;

/// All errors that can arise from build, reconcile and remote operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An asset transform failed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Listing or scaffolding the project layout failed.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A store-specific task was requested without `STORE`.
    #[error("no store configured; set STORE or pass --store")]
    StoreRequired,

    /// Unknown copy task label.
    #[error("unknown copy task '{0}'")]
    UnknownTask(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
