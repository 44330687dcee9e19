//! Debounced background flushing
//!
//! One task per store. It sleeps until a flush is requested, then waits for
//! a quiet period of `debounce` with no further requests before writing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{FlushOutcome, RecordStore};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Handle to a running flush task
#[derive(Debug)]
pub struct FlushWorker {
    store: Arc<RecordStore>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl FlushWorker {
    /// Start the flush task on the current tokio runtime
    pub fn spawn(store: Arc<RecordStore>, debounce: Duration) -> Self {
        let (shutdown, stop) = oneshot::channel();
        let handle = tokio::spawn(run(Arc::clone(&store), debounce, stop));
        debug!(debounce_ms = debounce.as_millis() as u64, "flush worker started");
        Self {
            store,
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// Stop the task and write anything still pending
    pub async fn shutdown(mut self) -> FlushOutcome {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            error!(error = %e, "flush worker ended abnormally");
        }

        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.force_flush()).await {
            Ok(outcome) => outcome,
            Err(e) => FlushOutcome::Failed(e.to_string()),
        }
    }
}

async fn run(store: Arc<RecordStore>, debounce: Duration, mut stop: oneshot::Receiver<()>) {
    let signal = store.flush_signal();

    loop {
        tokio::select! {
            _ = &mut stop => return,
            _ = signal.notified() => {}
        }

        // every new request restarts the quiet window
        loop {
            tokio::select! {
                _ = &mut stop => return,
                quiet = tokio::time::timeout(debounce, signal.notified()) => {
                    if quiet.is_err() {
                        break;
                    }
                }
            }
        }

        let flushing = Arc::clone(&store);
        match tokio::task::spawn_blocking(move || flushing.flush()).await {
            Ok(FlushOutcome::AlreadySaving) => {
                // a forced flush is running; try again after it
                store.request_flush();
            }
            Ok(FlushOutcome::Failed(e)) => {
                warn!(error = %e, "debounced flush failed; waiting for next change");
            }
            Ok(outcome) => debug!(?outcome, "debounced flush"),
            Err(e) => error!(error = %e, "flush task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::store::{MemorySink, StoreState};

    const DEBOUNCE: Duration = Duration::from_millis(1000);

    fn setup() -> (Arc<MemorySink>, Arc<RecordStore>) {
        let sink = Arc::new(MemorySink::new());
        let store = Arc::new(RecordStore::new(sink.clone()));
        (sink, store)
    }

    fn record(id: usize) -> Record {
        Record::new(id.to_string(), "Cashmere Jacket", "C0FFEE")
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_produces_one_flush() {
        let (sink, store) = setup();
        let worker = FlushWorker::spawn(Arc::clone(&store), DEBOUNCE);

        for i in 0..5 {
            store.put(record(i));
            advance(100).await;
        }
        assert_eq!(sink.persist_count(), 0);

        advance(1500).await;
        assert_eq!(sink.persist_count(), 1);
        assert_eq!(sink.saved().len(), 5);
        assert_eq!(store.state(), StoreState::Clean);

        assert_eq!(worker.shutdown().await, FlushOutcome::Clean);
        assert_eq!(sink.persist_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_quiet_window() {
        let (sink, store) = setup();
        let worker = FlushWorker::spawn(Arc::clone(&store), DEBOUNCE);

        store.put(record(0));
        advance(500).await;
        assert_eq!(sink.persist_count(), 0);

        advance(1000).await;
        assert_eq!(sink.persist_count(), 1);

        worker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_changes_postpone_flush() {
        let (sink, store) = setup();
        let worker = FlushWorker::spawn(Arc::clone(&store), DEBOUNCE);

        for i in 0..6 {
            store.put(record(i));
            advance(600).await;
        }
        assert_eq!(sink.persist_count(), 0);

        advance(1000).await;
        assert_eq!(sink.persist_count(), 1);
        assert_eq!(sink.saved().len(), 6);

        worker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_flush_separately() {
        let (sink, store) = setup();
        let worker = FlushWorker::spawn(Arc::clone(&store), DEBOUNCE);

        store.put(record(0));
        advance(2000).await;
        store.put(record(1));
        advance(2000).await;

        assert_eq!(sink.persist_count(), 2);
        worker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_changes() {
        let (sink, store) = setup();
        let worker = FlushWorker::spawn(Arc::clone(&store), DEBOUNCE);

        store.put(record(0));
        store.put(record(1));
        assert_eq!(worker.shutdown().await, FlushOutcome::Flushed(2));
        assert_eq!(sink.persist_count(), 1);
        assert_eq!(store.state(), StoreState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_retries_on_next_change() {
        let (sink, store) = setup();
        let worker = FlushWorker::spawn(Arc::clone(&store), DEBOUNCE);

        sink.set_failing(true);
        store.put(record(0));
        advance(1500).await;
        assert_eq!(sink.persist_count(), 0);
        assert_eq!(store.state(), StoreState::Dirty);

        sink.set_failing(false);
        store.put(record(1));
        advance(1500).await;
        assert_eq!(sink.persist_count(), 1);
        assert_eq!(sink.saved().len(), 2);

        worker.shutdown().await;
    }
}
