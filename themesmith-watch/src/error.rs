use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the watch runtime.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("sync error: {0}")]
    Sync(#[from] themesmith_sync::SyncError),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("{task} task join failure: {message}")]
    Join { task: String, message: String },

    #[error("nothing to watch: {root} has no src/ or store override tree")]
    NothingToWatch { root: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WatchError {
    WatchError::Io {
        path: path.into(),
        source,
    }
}
