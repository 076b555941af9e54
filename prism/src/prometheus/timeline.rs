//! Sampling-step selection and timeline alignment for range queries.

use crate::prometheus::types::Sample;

/// Floor for the sampling step, matching the common 15s scrape interval.
const MIN_STEP_SECS: i64 = 15;

/// Upper bound on the number of points returned per series.
const MAX_POINTS: i64 = 500;

/// Picks a sampling step for the `start..=end` range.
///
/// A positive `requested_step_secs` is honored as-is. Otherwise the step is
/// sized so a series carries at most [`MAX_POINTS`] points, never going
/// below [`MIN_STEP_SECS`].
pub fn adaptive_step(start_ts: i64, end_ts: i64, requested_step_secs: i64) -> i64 {
    if requested_step_secs > 0 {
        return requested_step_secs;
    }

    let span = (end_ts - start_ts).max(0);
    let step = (span as u64).div_ceil(MAX_POINTS as u64) as i64;
    step.max(MIN_STEP_SECS)
}

/// Aligns raw samples onto the regular `start..=end` grid with spacing
/// `step_secs`.
///
/// Interior gaps carry the last observed value forward. Grid instants before
/// the first observed sample are omitted rather than fabricated. `samples`
/// must be sorted by timestamp, which the backend guarantees.
pub fn align_samples(samples: &[Sample], start_ts: i64, end_ts: i64, step_secs: i64) -> Vec<Sample> {
    if samples.is_empty() || step_secs <= 0 {
        return Vec::new();
    }

    let mut aligned = Vec::new();
    let mut cursor = 0;
    let mut last_value: Option<f64> = None;

    let mut ts = start_ts;
    while ts <= end_ts {
        while cursor < samples.len() && samples[cursor].timestamp <= ts {
            last_value = Some(samples[cursor].value);
            cursor += 1;
        }
        if let Some(value) = last_value {
            aligned.push(Sample {
                timestamp: ts,
                value,
            });
        }
        ts += step_secs;
    }

    aligned
}
