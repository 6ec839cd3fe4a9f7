//! Batch coordination.
//!
//! A batch is a set of independent futures dispatched together. Results come
//! back one per submission, in submission order, whatever order the futures
//! finish in. The first error aborts the batch.

use std::future::Future;

use futures::future::try_join_all;
use tokio::sync::Mutex;

/// Run all futures concurrently and collect their results in submission
/// order. Fails fast: the first error is returned and the remaining futures
/// are dropped.
pub async fn join_ordered<I, F, T, E>(ops: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    try_join_all(ops).await
}

/// Runs batches one at a time.
///
/// A batch submitted while another is in flight waits in a FIFO queue and
/// starts only after the active batch's continuation has finished. Futures
/// are lazy, so nothing in a queued batch runs before its turn.
#[derive(Debug, Default)]
pub struct BatchRunner {
    /// Serializes batches; holds the number of batches started so far.
    gate: Mutex<u64>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one batch and return its ordered results.
    pub async fn run<I, F, T, E>(&self, ops: I) -> Result<Vec<T>, E>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, E>>,
    {
        self.run_then(ops, |results| async move { results }).await
    }

    /// Run one batch, then hand the aggregated result to `continuation`.
    ///
    /// The next queued batch is not started until `continuation` completes.
    pub async fn run_then<I, F, T, E, C, Fut, R>(&self, ops: I, continuation: C) -> R
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, E>>,
        C: FnOnce(Result<Vec<T>, E>) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut started = self.gate.lock().await;
        *started += 1;
        let batch = *started;

        let ops: Vec<F> = ops.into_iter().collect();
        tracing::debug!(batch, size = ops.len(), "batch dispatched");

        let results = join_ordered(ops).await;
        tracing::debug!(batch, ok = results.is_ok(), "batch complete");

        continuation(results).await
    }

    /// Number of batches started on this runner.
    pub async fn batches_started(&self) -> u64 {
        *self.gate.lock().await
    }
}
