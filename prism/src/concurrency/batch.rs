use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use metrics::{counter, histogram};
use tracing::debug;

use crate::concurrency::cancel::create_cancel_channel;
use crate::error::{PrismError, PrismResult};
use crate::metrics::{
    OUTCOME, OUTCOME_ERROR, OUTCOME_OK, OUTCOME_TIMEOUT, PRISM_BATCH_DURATION_SECONDS,
    PRISM_BATCH_RUNS_TOTAL, PRISM_BATCH_TASKS_TOTAL,
};

/// Closure that applies an acquired result to the caller-owned sink.
///
/// Produced by a successful acquire phase and invoked exactly once, on a
/// single logical thread of control, strictly after every acquire in the
/// batch has resolved. A merge must only write the sink slot its task was
/// assigned at construction time.
pub type Merge<S> = Box<dyn FnOnce(&mut S) -> PrismResult<()> + Send>;

/// A two-phase unit of work driven by [`run`].
///
/// The acquire phase performs the slow, failable I/O and returns the merge
/// closure that applies the result. Tasks are consumed exactly once by a
/// single batch. An acquire may itself construct and run a nested batch with
/// its own deadline.
#[async_trait]
pub trait FetchTask<S>: Send + 'static {
    /// Identifying key (pod name, metric type, time window) used to wrap
    /// errors surfaced by this task.
    fn key(&self) -> String;

    /// Performs the I/O-bound work and returns the merge closure to apply.
    async fn acquire(self: Box<Self>) -> PrismResult<Merge<S>>;
}

/// Runs a batch of tasks under a single deadline.
///
/// Every task's acquire phase is launched concurrently. Once all acquires
/// have resolved, the merge closures are applied to `sink` one at a time, in
/// the submission order of `tasks`, regardless of the order in which the
/// acquires completed. This keeps output structures reproducible and removes
/// the need for any lock around the sink, provided tasks write disjoint
/// slots.
///
/// The batch is all-or-nothing:
/// - If the deadline elapses with acquires outstanding, every in-flight
///   acquire is canceled and the [`PrismError::BatchTimeout`] sentinel is
///   returned verbatim. No merges run.
/// - If any acquire fails, its siblings are canceled and the error is
///   returned wrapped in [`PrismError::Acquire`]. No merges run, including
///   for tasks whose acquire had already succeeded.
/// - If a merge fails, the remaining merges are skipped and the error is
///   returned wrapped in [`PrismError::Merge`].
///
/// All spawned acquire work is joined before this function returns; no
/// background work outlives the call.
pub async fn run<S: 'static>(
    deadline: Duration,
    tasks: Vec<Box<dyn FetchTask<S>>>,
    sink: &mut S,
) -> PrismResult<()> {
    if tasks.is_empty() {
        return Ok(());
    }

    let task_count = tasks.len();
    debug!(tasks = task_count, ?deadline, "running batch");
    counter!(PRISM_BATCH_TASKS_TOTAL).increment(task_count as u64);
    let started_at = Instant::now();

    let (cancel_tx, _cancel_rx) = create_cancel_channel();

    // Fan out every acquire on its own tokio task, racing it against the
    // batch cancel signal so that siblings exit promptly once the outcome
    // is decided.
    let mut pending = FuturesUnordered::new();
    for (index, task) in tasks.into_iter().enumerate() {
        let key = task.key();
        let mut cancel_rx = cancel_tx.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                result = task.acquire() => result,
                _ = cancel_rx.changed() => Err(PrismError::Canceled),
            }
        });
        pending.push(async move { (index, key, handle.await) });
    }

    let expired = tokio::time::sleep(deadline);
    tokio::pin!(expired);

    // Merges are stored at their submission index so the apply loop below
    // runs in submission order, not arrival order.
    let mut merges: Vec<Option<(String, Merge<S>)>> = Vec::with_capacity(task_count);
    merges.resize_with(task_count, || None);
    let mut outcome: Option<PrismError> = None;

    // Fan in until every spawned acquire has been joined, even after the
    // outcome is already decided. This is what guarantees no worker leaks
    // past the return of this function.
    while !pending.is_empty() {
        tokio::select! {
            Some((index, key, joined)) = pending.next() => {
                match joined {
                    Ok(Ok(merge)) => {
                        merges[index] = Some((key, merge));
                    }
                    // Cancellations are only expected after the outcome is
                    // decided. One arriving earlier means the acquire bailed
                    // out on its own; letting it pass would leave its merge
                    // slot empty while the rest still apply.
                    Ok(Err(PrismError::Canceled)) if outcome.is_some() => {}
                    Ok(Err(source)) => {
                        if outcome.is_none() {
                            outcome = Some(PrismError::Acquire {
                                key,
                                source: Box::new(source),
                            });
                            let _ = cancel_tx.cancel();
                        }
                    }
                    Err(join_error) => {
                        if outcome.is_none() {
                            outcome = Some(PrismError::AcquirePanic {
                                key,
                                detail: join_error.to_string(),
                            });
                            let _ = cancel_tx.cancel();
                        }
                    }
                }
            }
            () = &mut expired, if outcome.is_none() => {
                outcome = Some(PrismError::BatchTimeout);
                let _ = cancel_tx.cancel();
            }
        }
    }

    histogram!(PRISM_BATCH_DURATION_SECONDS).record(started_at.elapsed().as_secs_f64());

    if let Some(error) = outcome {
        let outcome_label = if matches!(error, PrismError::BatchTimeout) {
            OUTCOME_TIMEOUT
        } else {
            OUTCOME_ERROR
        };
        counter!(PRISM_BATCH_RUNS_TOTAL, OUTCOME => outcome_label).increment(1);
        debug!(error = %error, "batch failed, no merges applied");

        return Err(error);
    }

    for (key, merge) in merges.into_iter().flatten() {
        merge(sink).map_err(|source| PrismError::Merge {
            key,
            source: Box::new(source),
        })?;
    }

    counter!(PRISM_BATCH_RUNS_TOTAL, OUTCOME => OUTCOME_OK).increment(1);

    Ok(())
}
