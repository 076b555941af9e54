use async_trait::async_trait;

use crate::error::PrismResult;
use crate::prometheus::types::{Matrix, Vector};

/// Options for a range query against the metrics backend.
#[derive(Debug, Clone, Copy)]
pub struct RangeQueryOptions {
    /// Inclusive start of the range, as a unix timestamp in seconds.
    pub start_ts: i64,
    /// Inclusive end of the range, as a unix timestamp in seconds.
    pub end_ts: i64,
    /// Spacing between returned samples, in seconds.
    pub step_secs: i64,
}

/// Read-only client for a Prometheus-compatible metrics backend.
///
/// The backend is treated as an opaque, possibly slow, possibly failing
/// dependency; callers bound it with the batch executor's deadline rather
/// than relying on the client itself.
#[async_trait]
pub trait MetricsQuerier: Send + Sync {
    /// Evaluates `query` at every step of the given range.
    async fn range_query(&self, query: &str, options: RangeQueryOptions) -> PrismResult<Matrix>;

    /// Evaluates `query` at a single instant.
    async fn instant_query(&self, query: &str, at_ts: i64) -> PrismResult<Vector>;
}
