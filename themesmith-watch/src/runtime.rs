use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{recommended_watcher, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use themesmith_core::{ThemeLayout, Tree};
use themesmith_sync::BuildContext;

use crate::error::{io_err, WatchError};
use crate::event::{jobs_for_event, ChangeKind, WatchJob};
use crate::queue::KeyedQueue;

/// Watcher knobs, taken from the resolved configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// `Some` selects the polling backend.
    pub poll_interval: Option<Duration>,
    pub debounce: Duration,
}

impl WatchOptions {
    pub fn from_context(ctx: &BuildContext) -> Self {
        Self {
            poll_interval: ctx.config.poll_interval,
            debounce: ctx.config.debounce,
        }
    }
}

/// Start watching and block the current thread until ctrl-c.
pub fn start_blocking(ctx: BuildContext) -> Result<(), WatchError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(Arc::new(ctx)))
}

/// Watch until ctrl-c.
pub async fn run(ctx: Arc<BuildContext>) -> Result<(), WatchError> {
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => tracing::info!("received ctrl-c, stopping watch"),
                        Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
                    }
                    let _ = shutdown.send(());
                }
            }
        })
    };

    let options = WatchOptions::from_context(&ctx);
    let result = watch_until(ctx, options, shutdown_tx.subscribe()).await;
    let _ = shutdown_tx.send(());
    signal_handle.await.map_err(|err| WatchError::Join {
        task: "signal_handler".to_string(),
        message: err.to_string(),
    })?;
    result
}

/// Watch the source and override trees until `shutdown` fires, then drain
/// every queued job.
pub async fn watch_until(
    ctx: Arc<BuildContext>,
    options: WatchOptions,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), WatchError> {
    // Canonicalize so event paths (real paths) match the layout prefixes.
    let root = fs::canonicalize(ctx.layout.root()).map_err(|e| io_err(ctx.layout.root(), e))?;
    let layout = ThemeLayout::new(root, ctx.layout.store().cloned());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher = make_watcher(event_tx, options.poll_interval)?;
    let roots = watch_roots(&layout);
    if roots.is_empty() {
        return Err(WatchError::NothingToWatch {
            root: layout.root().to_path_buf(),
        });
    }
    for dir in &roots {
        watcher.watch(dir, RecursiveMode::Recursive)?;
        tracing::info!(path = %dir.display(), "watching");
    }

    let mut queue = {
        let ctx = ctx.clone();
        KeyedQueue::new(move |job: WatchJob| run_job(&ctx, &job))
    };
    let mut debouncer = Debouncer::new(options.debounce);

    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = sleep_until_deadline(deadline) => {
                for (path, change) in debouncer.take_due(Instant::now()) {
                    dispatch(&layout, &mut queue, &path, change)?;
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                let Some(change) = change_kind(&event.kind) else {
                    continue;
                };

                let now = Instant::now();
                for path in event.paths {
                    debouncer.record(path, change, now);
                }
            }
        }
    }

    drop(watcher);
    for (path, change) in debouncer.drain_all() {
        dispatch(&layout, &mut queue, &path, change)?;
    }
    queue.close().await
}

fn dispatch(
    layout: &ThemeLayout,
    queue: &mut KeyedQueue<PathBuf, WatchJob>,
    path: &Path,
    change: ChangeKind,
) -> Result<(), WatchError> {
    if change == ChangeKind::Write && !path.is_file() {
        return Ok(());
    }
    for job in jobs_for_event(layout, path, change) {
        tracing::debug!(job = %job.describe(), "queued");
        queue.submit(job.output_key(layout), job)?;
    }
    Ok(())
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Trailing-edge debounce: a path is released once it has been quiet for
/// the whole window, carrying the last change seen for it.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, (ChangeKind, Instant)>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    fn record(&mut self, path: PathBuf, change: ChangeKind, now: Instant) {
        self.pending.insert(path, (change, now));
    }

    /// When the oldest pending path becomes due.
    fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|(_, seen_at)| *seen_at + self.window)
            .min()
    }

    /// Remove and return the paths quiet since `now - window`, oldest first.
    fn take_due(&mut self, now: Instant) -> Vec<(PathBuf, ChangeKind)> {
        let window = self.window;
        let due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, seen_at))| *seen_at + window <= now)
            .map(|(path, _)| path.clone())
            .collect();
        let mut taken: Vec<(PathBuf, ChangeKind, Instant)> = due
            .into_iter()
            .filter_map(|path| {
                self.pending
                    .remove(&path)
                    .map(|(change, seen_at)| (path, change, seen_at))
            })
            .collect();
        taken.sort_by_key(|(_, _, seen_at)| *seen_at);
        taken
            .into_iter()
            .map(|(path, change, _)| (path, change))
            .collect()
    }

    /// Everything still pending, oldest first.
    fn drain_all(&mut self) -> Vec<(PathBuf, ChangeKind)> {
        let mut taken: Vec<_> = self.pending.drain().collect();
        taken.sort_by_key(|(_, (_, seen_at))| *seen_at);
        taken
            .into_iter()
            .map(|(path, (change, _))| (path, change))
            .collect()
    }
}

fn run_job(ctx: &BuildContext, job: &WatchJob) {
    match job.run(ctx) {
        Ok(writes) => {
            let changed = writes.iter().filter(|w| w.is_change()).count();
            tracing::info!(job = %job.describe(), changed, "rebuilt");
        }
        Err(err) => tracing::error!(job = %job.describe(), error = %err, "watch job failed"),
    }
}

fn make_watcher(
    tx: mpsc::UnboundedSender<notify::Result<Event>>,
    poll_interval: Option<Duration>,
) -> Result<Box<dyn Watcher + Send>, WatchError> {
    let handler = move |event: notify::Result<Event>| {
        let _ = tx.send(event);
    };
    match poll_interval {
        Some(interval) => {
            let config = notify::Config::default().with_poll_interval(interval);
            Ok(Box::new(PollWatcher::new(handler, config)?))
        }
        None => Ok(Box::new(recommended_watcher(handler)?)),
    }
}

/// `src/` plus the override tree, whichever exist.
fn watch_roots(layout: &ThemeLayout) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(src) = layout.tree_dir(Tree::Source) {
        push_existing(&mut roots, src);
    }
    if let Some(store) = layout.tree_dir(Tree::Store) {
        push_existing(&mut roots, store);
    }
    roots
}

fn push_existing(roots: &mut Vec<PathBuf>, dir: PathBuf) {
    if dir.is_dir() {
        roots.push(dir);
    } else {
        tracing::warn!(path = %dir.display(), "not watching missing directory");
    }
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Remove(_) => Some(ChangeKind::Remove),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Remove),
        EventKind::Create(_) | EventKind::Modify(_) => Some(ChangeKind::Write),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use tokio::time::advance;

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn rapid_edits_release_once_after_the_window() {
        let window = Duration::from_millis(100);
        let mut debouncer = Debouncer::new(window);
        let path = PathBuf::from("/theme/src/assets/base.css");

        for _ in 0..5 {
            debouncer.record(path.clone(), ChangeKind::Write, Instant::now());
            assert!(debouncer.take_due(Instant::now()).is_empty());
            advance(Duration::from_millis(10)).await;
        }

        // The last edit landed 10ms ago; the window restarts on every edit.
        advance(Duration::from_millis(80)).await;
        assert!(debouncer.take_due(Instant::now()).is_empty());
        assert_eq!(
            debouncer.next_deadline(),
            Some(Instant::now() + Duration::from_millis(10))
        );

        advance(Duration::from_millis(10)).await;
        assert_eq!(
            debouncer.take_due(Instant::now()),
            vec![(path, ChangeKind::Write)]
        );
        assert_eq!(debouncer.next_deadline(), None);
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn latest_change_wins_and_paths_release_in_order() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        let first = PathBuf::from("/theme/src/layout/theme.liquid");
        let second = PathBuf::from("/theme/stores/uk/layout/theme.liquid");

        debouncer.record(first.clone(), ChangeKind::Write, Instant::now());
        advance(Duration::from_millis(5)).await;
        debouncer.record(second.clone(), ChangeKind::Write, Instant::now());
        debouncer.record(first.clone(), ChangeKind::Remove, Instant::now());
        advance(Duration::from_millis(1)).await;
        debouncer.record(second.clone(), ChangeKind::Write, Instant::now());

        advance(Duration::from_millis(60)).await;
        assert_eq!(
            debouncer.take_due(Instant::now()),
            vec![(first, ChangeKind::Remove), (second, ChangeKind::Write)]
        );
    }

    #[test]
    fn pending_changes_are_flushed_on_shutdown() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        let path = PathBuf::from("/theme/src/snippets/card.liquid");
        debouncer.record(path.clone(), ChangeKind::Write, Instant::now());
        assert_eq!(debouncer.drain_all(), vec![(path, ChangeKind::Write)]);
        assert!(debouncer.drain_all().is_empty());
    }

    #[test]
    fn event_kinds_map_to_changes() {
        assert_eq!(
            change_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Write)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Write)
        );
        assert_eq!(
            change_kind(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Remove)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(ChangeKind::Remove)
        );
        assert_eq!(change_kind(&EventKind::Any), None);
    }
}
