//! Watch mode: filesystem watcher → minimal rebuild jobs → per-output
//! serialised workers.

mod error;
pub mod event;
pub mod queue;
mod runtime;

pub use error::WatchError;
pub use event::{jobs_for_event, ChangeKind, WatchJob};
pub use queue::KeyedQueue;
pub use runtime::{run, start_blocking, watch_until, WatchOptions};
