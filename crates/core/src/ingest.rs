//! The ingestion pipeline and its background loop.
//!
//! One cycle is: fetch a batch → drop candidates with empty text → fingerprint → insert if
//! absent. [`ingest_batch`] is the synchronous pipeline step; [`IngestionLoop`] repeats a
//! fetch + ingest cycle on a fixed interval until its stop signal fires.
//!
//! ## Loop states
//!
//! ```text
//! Starting --init store--> Running --stop signal--> Stopped
//! ```
//!
//! The loop suspends only while fetching and while waiting for the next cycle. Both are raced
//! against the stop signal, so shutdown does not wait for a slow upstream or a long interval.
//! Failures inside a cycle (fetch errors, storage errors, even a panic in the ingest step) are
//! logged and the next cycle runs on schedule; the fixed interval is the only retry policy.

use crate::fetcher::{QuoteSource, RawQuote};
use crate::fingerprint::fingerprint;
use crate::normalize::normalize;
use crate::store::QuoteStore;
use quotes_types::NonEmptyText;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Counters for one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Candidates delivered by the source.
    pub fetched: usize,
    /// Candidates with non-empty text for which an insert was attempted.
    pub attempted: usize,
    /// Candidates dropped because their text was empty.
    pub skipped: usize,
    /// Inserts that created a new row.
    pub inserted: usize,
    /// Inserts that failed with a storage error.
    pub failed: usize,
}

/// Summary of one loop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub ingest: IngestReport,
    /// Whether the fetch failed (and the batch was treated as empty).
    pub fetch_failed: bool,
    /// Store size after the cycle, if it could be read.
    pub total: Option<u64>,
}

/// Run the dedup pipeline over one batch.
///
/// Each insert commits on its own; a storage error on one candidate is logged, counted in
/// [`IngestReport::failed`] and does not stop the rest of the batch.
pub fn ingest_batch(store: &QuoteStore, batch: &[RawQuote]) -> IngestReport {
    let mut report = IngestReport {
        fetched: batch.len(),
        ..IngestReport::default()
    };

    for raw in batch {
        if normalize(raw.text.as_deref()).is_empty() {
            report.skipped += 1;
            continue;
        }
        let Some(text) = NonEmptyText::from_optional(raw.text.as_deref()) else {
            report.skipped += 1;
            continue;
        };

        let id = fingerprint(raw.text.as_deref(), raw.author.as_deref());
        report.attempted += 1;
        match store.insert_if_absent(&id, &text, raw.author.as_deref()) {
            Ok(true) => report.inserted += 1,
            Ok(false) => {}
            Err(e) => {
                report.failed += 1;
                tracing::error!(quote_id = %id, "failed to store quote: {}", e);
            }
        }
    }

    report
}

/// Lifecycle state of an [`IngestionLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Spawned; the schema has not been ensured yet.
    Starting,
    Running,
    Stopped,
}

/// Periodic fetch-and-store loop.
pub struct IngestionLoop<S> {
    store: Arc<QuoteStore>,
    source: S,
    interval: Duration,
}

impl<S: QuoteSource + 'static> IngestionLoop<S> {
    /// Creates a loop that polls `source` every `interval` and writes into `store`.
    ///
    /// The store handle should be dedicated to the loop; readers open their own.
    pub fn new(store: Arc<QuoteStore>, source: S, interval: Duration) -> Self {
        Self {
            store,
            source,
            interval,
        }
    }

    /// Run a single fetch + ingest cycle.
    ///
    /// A fetch failure counts as an empty batch. The ingest step runs on the blocking pool so
    /// SQLite work does not stall the async runtime; if it panics the cycle reports nothing
    /// inserted and the panic is logged.
    pub async fn run_cycle(&self) -> CycleReport {
        tracing::debug!("fetching quotes");
        let (batch, fetch_failed) = match self.source.fetch_batch().await {
            Ok(batch) => (batch, false),
            Err(e) => {
                tracing::warn!("fetch failed, treating as empty batch: {}", e);
                (Vec::new(), true)
            }
        };
        self.ingest(batch, fetch_failed).await
    }

    async fn ingest(&self, batch: Vec<RawQuote>, fetch_failed: bool) -> CycleReport {
        let store = Arc::clone(&self.store);
        let fetched = batch.len();
        let ingest = match tokio::task::spawn_blocking(move || ingest_batch(&store, &batch)).await
        {
            Ok(ingest) => ingest,
            Err(e) => {
                tracing::error!("ingest task failed: {}", e);
                IngestReport {
                    fetched,
                    ..IngestReport::default()
                }
            }
        };

        let store = Arc::clone(&self.store);
        let total = match tokio::task::spawn_blocking(move || store.count()).await {
            Ok(Ok(total)) => Some(total),
            Ok(Err(e)) => {
                tracing::error!("failed to count stored quotes: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("count task failed: {}", e);
                None
            }
        };

        let report = CycleReport {
            ingest,
            fetch_failed,
            total,
        };
        tracing::info!(
            fetched = report.ingest.fetched,
            attempted = report.ingest.attempted,
            inserted = report.ingest.inserted,
            failed = report.ingest.failed,
            total = ?report.total,
            "ingestion cycle complete"
        );
        report
    }

    /// Drive cycles until `stop` carries `true` (or its sender is dropped).
    ///
    /// `state` is set to [`LoopState::Running`] once the schema is ensured and to
    /// [`LoopState::Stopped`] on exit.
    pub async fn run(self, mut stop: watch::Receiver<bool>, state: watch::Sender<LoopState>) {
        self.init_store().await;
        state.send_replace(LoopState::Running);
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "ingestion loop started");

        loop {
            let stopped = *stop.borrow();
            if stopped {
                break;
            }

            tokio::select! {
                biased;

                _ = stop_requested(&mut stop) => break,
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                biased;

                _ = stop_requested(&mut stop) => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        state.send_replace(LoopState::Stopped);
        tracing::info!("ingestion loop stopped");
    }

    async fn init_store(&self) {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.init()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("failed to initialise quote store: {}", e),
            Err(e) => tracing::error!("store initialisation task failed: {}", e),
        }
    }

    /// Spawn the loop on the current runtime and return a handle for stopping it.
    pub fn spawn(self) -> IngestionHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(LoopState::Starting);
        let join = tokio::spawn(self.run(stop_rx, state_tx));
        IngestionHandle {
            stop_tx,
            state_rx,
            join,
        }
    }
}

/// Resolves once a stop has been requested or the sender has gone away.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    // An error means the sender was dropped; nobody can ask us to keep going.
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Owner-side handle of a spawned [`IngestionLoop`].
#[derive(Debug)]
pub struct IngestionHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<LoopState>,
    join: JoinHandle<()>,
}

impl IngestionHandle {
    /// Current lifecycle state of the loop.
    pub fn state(&self) -> LoopState {
        *self.state_rx.borrow()
    }

    /// Ask the loop to stop without waiting for it.
    pub fn request_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Send the stop signal and wait at most `grace` for the loop to exit.
    ///
    /// Returns `true` if the loop finished within the grace period. On timeout the task is
    /// aborted; inserts are individually atomic so nothing is left half-written.
    pub async fn shutdown(self, grace: Duration) -> bool {
        self.request_stop();
        let mut join = self.join;
        match tokio::time::timeout(grace, &mut join).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!("ingestion loop task failed: {}", e);
                true
            }
            Err(_) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "ingestion loop did not stop in time, aborting"
                );
                join.abort();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    fn memory_store() -> Arc<QuoteStore> {
        let store = QuoteStore::open_in_memory().unwrap();
        store.init().unwrap();
        Arc::new(store)
    }

    fn raw(q: &str, a: &str) -> RawQuote {
        RawQuote::new(Some(q), Some(a))
    }

    /// Returns scripted results in order, then the last one forever.
    struct ScriptedSource {
        calls: Arc<AtomicUsize>,
        script: Mutex<Vec<Result<Vec<RawQuote>, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<RawQuote>, FetchError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                calls: Arc::clone(&calls),
                script: Mutex::new(script.into_iter().rev().collect()),
            };
            (source, calls)
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                return script.pop().unwrap();
            }
            match script.last() {
                Some(Ok(batch)) => Ok(batch.clone()),
                Some(Err(_)) | None => Err(FetchError::Status(503)),
            }
        }
    }

    /// Never answers; models a hung upstream.
    struct HangingSource;

    #[async_trait]
    impl QuoteSource for HangingSource {
        async fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError> {
            std::future::pending().await
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn end_to_end_batch_stores_distinct_quotes() {
        let store = memory_store();
        let batch = vec![raw("A", "X"), raw("A", "X"), raw("B", "Y")];

        let report = ingest_batch(&store, &batch);

        assert_eq!(report.fetched, 3);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(store.count().unwrap(), 2);

        let quote = store.random().unwrap();
        assert!(["A", "B"].contains(&quote.text.as_str()));
        assert!(quote.added_at.timestamp() > 0);
    }

    #[test]
    fn empty_and_missing_text_is_never_stored() {
        let store = memory_store();
        let batch = vec![
            RawQuote::new(None, Some("Nobody")),
            RawQuote::new(Some(""), Some("Nobody")),
            RawQuote::new(Some(" \n\t "), None),
        ];

        let report = ingest_batch(&store, &batch);

        assert_eq!(report.skipped, 3);
        assert_eq!(report.attempted, 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn storage_error_aborts_only_that_candidate() {
        let store = memory_store();
        store.with_connection(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON quotes
                 WHEN NEW.quote = 'BAD'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        });
        let batch = vec![raw("A", "X"), raw("BAD", "X"), raw("B", "Y")];

        let report = ingest_batch(&store, &batch);

        assert_eq!(report.attempted, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(store.count().unwrap(), 2);
        assert!(store
            .get(&fingerprint(Some("BAD"), Some("X")))
            .unwrap()
            .is_none());
        assert!(store
            .get(&fingerprint(Some("B"), Some("Y")))
            .unwrap()
            .is_some());
    }

    #[test]
    fn separator_only_text_is_skipped() {
        let store = memory_store();
        let batch = vec![RawQuote::new(Some("\u{1f}\u{1c}"), Some("Nobody"))];

        let report = ingest_batch(&store, &batch);

        assert_eq!(report.skipped, 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn repeated_batches_are_idempotent() {
        let store = memory_store();
        let first = vec![raw("Be yourself.", "Oscar Wilde")];
        let second = vec![
            raw("  be yourself.  ", "OSCAR WILDE"),
            raw("Another one", "Someone"),
        ];

        assert_eq!(ingest_batch(&store, &first).inserted, 1);
        assert_eq!(ingest_batch(&store, &second).inserted, 1);
        assert_eq!(ingest_batch(&store, &second).inserted, 0);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_cycle_treats_fetch_error_as_empty_batch() {
        let store = memory_store();
        let (source, _) = ScriptedSource::new(vec![Err(FetchError::RateLimited)]);
        let ingestion = IngestionLoop::new(Arc::clone(&store), source, Duration::from_secs(1));

        let report = ingestion.run_cycle().await;

        assert!(report.fetch_failed);
        assert_eq!(report.ingest, IngestReport::default());
        assert_eq!(report.total, Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loop_survives_fetch_failure_and_keeps_polling() {
        let store = memory_store();
        let (source, calls) = ScriptedSource::new(vec![
            Err(FetchError::Status(500)),
            Ok(vec![raw("A", "X"), raw("B", "Y")]),
        ]);

        let handle =
            IngestionLoop::new(Arc::clone(&store), source, Duration::from_millis(20)).spawn();

        wait_until(|| calls.load(Ordering::SeqCst) >= 3).await;
        assert_eq!(handle.state(), LoopState::Running);
        assert_eq!(store.count().unwrap(), 2);

        assert!(handle.shutdown(Duration::from_secs(2)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_during_wait_exits_promptly() {
        let store = memory_store();
        let (source, calls) = ScriptedSource::new(vec![Ok(vec![raw("A", "X")])]);

        let handle =
            IngestionLoop::new(Arc::clone(&store), source, Duration::from_secs(3600)).spawn();
        wait_until(|| calls.load(Ordering::SeqCst) >= 1 && store.count().unwrap_or(0) == 1).await;

        let started = Instant::now();
        assert!(handle.shutdown(Duration::from_secs(2)).await);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_during_hung_fetch_exits_promptly() {
        let store = memory_store();
        let handle =
            IngestionLoop::new(Arc::clone(&store), HangingSource, Duration::from_secs(1)).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.shutdown(Duration::from_secs(2)).await);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn spawned_loop_is_starting_until_store_is_ready() {
        let store = memory_store();
        let (source, _) = ScriptedSource::new(vec![Ok(vec![])]);

        let handle = IngestionLoop::new(store, source, Duration::from_secs(3600)).spawn();
        assert_eq!(handle.state(), LoopState::Starting);

        wait_until(|| handle.state() == LoopState::Running).await;
        assert!(handle.shutdown(Duration::from_secs(2)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn state_reports_stopped_after_exit() {
        let store = memory_store();
        let (source, _) = ScriptedSource::new(vec![Ok(vec![])]);
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, mut state_rx) = watch::channel(LoopState::Running);

        let ingestion = IngestionLoop::new(store, source, Duration::from_secs(3600));
        let task = tokio::spawn(ingestion.run(stop_rx, state_tx));

        stop_tx.send_replace(true);
        task.await.unwrap();
        assert_eq!(*state_rx.borrow_and_update(), LoopState::Stopped);
    }
}
