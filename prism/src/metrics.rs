use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

pub const PRISM_BATCH_RUNS_TOTAL: &str = "prism_batch_runs_total";
pub const PRISM_BATCH_TASKS_TOTAL: &str = "prism_batch_tasks_total";
pub const PRISM_BATCH_DURATION_SECONDS: &str = "prism_batch_duration_seconds";
pub const OUTCOME: &str = "outcome";
pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_TIMEOUT: &str = "timeout";
pub const OUTCOME_ERROR: &str = "error";

/// Register metrics emitted by the batch executor. This should be called once
/// during application startup. It is safe to call this method multiple times.
/// It is guaranteed to register the metrics only once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            PRISM_BATCH_RUNS_TOTAL,
            Unit::Count,
            "Total number of batch executions, labeled by outcome"
        );

        describe_counter!(
            PRISM_BATCH_TASKS_TOTAL,
            Unit::Count,
            "Total number of tasks submitted to the batch executor"
        );

        describe_histogram!(
            PRISM_BATCH_DURATION_SECONDS,
            Unit::Seconds,
            "Time taken in seconds to run a batch to completion"
        );
    });
}
