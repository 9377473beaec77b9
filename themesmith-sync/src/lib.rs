//! # themesmith-sync
//!
//! Everything that moves files between the project trees:
//!
//! - [`build`]: copy tasks from `src/` and `stores/<STORE>/` into `dist/`
//! - [`reconcile`]: merge a `download/` snapshot back into the override and
//!   source trees
//! - [`diff`]: preview of a reconciliation as unified diffs
//! - [`remote`]: the external theme CLI and the fetch drivers
//! - [`writer`]: hash-gated atomic writes used by all of the above

pub mod build;
pub mod diff;
pub mod error;
pub mod reconcile;
pub mod remote;
pub mod writer;

pub use build::{build, run_task, BuildContext, BuildReport, CopyTask, TaskReport};
pub use diff::{diff_reconcile, DiffReport, FileDiff};
pub use error::SyncError;
pub use reconcile::{
    apply, plan, prereconcile, reconcile, reset_download, PlanOptions, ReconcilePlan,
    ReconcileReport, ReconcileScope,
};
pub use remote::{deploy, fetch_full, fetch_partial, FetchReport, RemoteOutcome, ThemeCommand};
pub use writer::WriteResult;
