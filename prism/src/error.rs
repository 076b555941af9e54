use thiserror::Error;

/// Result type used throughout the engine.
pub type PrismResult<T> = Result<T, PrismError>;

/// Errors produced by the batch executor and the metrics backend client.
///
/// [`PrismError::BatchTimeout`] is a sentinel: it is returned verbatim when a
/// batch's deadline elapses and is never wrapped with task context. Failures
/// surfaced by individual tasks are wrapped in [`PrismError::Acquire`] or
/// [`PrismError::Merge`] together with the task's identifying key.
#[derive(Debug, Error)]
pub enum PrismError {
    /// The batch deadline elapsed with acquire phases still outstanding.
    #[error("batch deadline exceeded")]
    BatchTimeout,

    /// A task's acquire phase failed. Cancels the rest of the batch.
    #[error("acquire failed for task `{key}`: {source}")]
    Acquire {
        key: String,
        #[source]
        source: Box<PrismError>,
    },

    /// A task's merge phase failed. Aborts the remaining merge sequence.
    #[error("merge failed for task `{key}`: {source}")]
    Merge {
        key: String,
        #[source]
        source: Box<PrismError>,
    },

    /// A task's acquire phase panicked.
    #[error("acquire panicked for task `{key}`: {detail}")]
    AcquirePanic { key: String, detail: String },

    /// A task's acquire phase was canceled because a sibling failed or the
    /// batch deadline elapsed. Never surfaced to callers; the first resolved
    /// failure or the timeout sentinel wins.
    #[error("task canceled")]
    Canceled,

    /// An HTTP request against the metrics backend failed.
    #[error("metrics backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The metrics backend rejected a query.
    #[error("metrics backend rejected query ({error_type}): {message}")]
    QueryRejected { error_type: String, message: String },

    /// A metrics backend payload could not be deserialized.
    #[error("failed to decode metrics backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A sample in a metrics backend payload was malformed.
    #[error("malformed sample: {detail}")]
    Sample { detail: String },
}

impl PrismError {
    /// Returns true if this error is, or wraps, the batch timeout sentinel.
    ///
    /// A nested batch that times out surfaces as an acquire failure of the
    /// parent task; this walks the wrapping chain so callers can still map
    /// the outcome to a timeout status.
    pub fn is_batch_timeout(&self) -> bool {
        match self {
            PrismError::BatchTimeout => true,
            PrismError::Acquire { source, .. } | PrismError::Merge { source, .. } => {
                source.is_batch_timeout()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_sentinel_is_detected_through_wrapping() {
        let nested = PrismError::Acquire {
            key: "pod-0".to_string(),
            source: Box::new(PrismError::BatchTimeout),
        };
        assert!(nested.is_batch_timeout());

        let plain = PrismError::Acquire {
            key: "pod-0".to_string(),
            source: Box::new(PrismError::Sample {
                detail: "bad value".to_string(),
            }),
        };
        assert!(!plain.is_batch_timeout());
    }
}
