//! Per-output-path job serialisation.
//!
//! Every distinct key gets its own FIFO worker task. Jobs submitted under
//! the same key run strictly one after another in submission order; jobs
//! under different keys run concurrently. The handler is blocking and runs
//! on tokio's blocking pool.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::WatchError;

type Handler<J> = Arc<dyn Fn(J) + Send + Sync>;

pub struct KeyedQueue<K, J> {
    workers: HashMap<K, mpsc::UnboundedSender<J>>,
    handles: Vec<(K, JoinHandle<()>)>,
    handler: Handler<J>,
}

impl<K, J> KeyedQueue<K, J>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
    J: Send + 'static,
{
    pub fn new(handler: impl Fn(J) + Send + Sync + 'static) -> Self {
        Self {
            workers: HashMap::new(),
            handles: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Queue `job` behind every earlier job with the same `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, key: K, job: J) -> Result<(), WatchError> {
        let handler = self.handler.clone();
        let handles = &mut self.handles;
        let sender = self.workers.entry(key.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            handles.push((key, tokio::spawn(worker(rx, handler))));
            tx
        });
        sender
            .send(job)
            .map_err(|_| WatchError::ChannelClosed("keyed job queue"))
    }

    /// Number of keys that have a worker.
    pub fn keys(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting jobs and wait for every queued job to finish.
    pub async fn close(self) -> Result<(), WatchError> {
        drop(self.workers);
        for (key, handle) in self.handles {
            handle.await.map_err(|err| WatchError::Join {
                task: format!("queue worker {key:?}"),
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}

async fn worker<J: Send + 'static>(mut rx: mpsc::UnboundedReceiver<J>, handler: Handler<J>) {
    while let Some(job) = rx.recv().await {
        let handler = handler.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || handler(job)).await {
            tracing::error!(error = %err, "watch job panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn same_key_runs_in_submission_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut queue = KeyedQueue::new(move |(i, delay_ms): (usize, u64)| {
            std::thread::sleep(Duration::from_millis(delay_ms));
            sink.lock().unwrap().push(i);
        });

        for i in 0..5usize {
            // Earlier jobs sleep longer, so any overlap would reorder them.
            queue
                .submit("dist/assets/x.css", (i, 25 - 5 * i as u64))
                .unwrap();
        }
        queue.close().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn different_keys_get_their_own_worker() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut queue = KeyedQueue::new(move |key: &'static str| {
            sink.lock().unwrap().push(key);
        });

        queue.submit("a", "a").unwrap();
        queue.submit("b", "b").unwrap();
        queue.submit("a", "a").unwrap();
        assert_eq!(queue.keys(), 2);
        queue.close().await.unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a", "a", "b"]);
    }
}
