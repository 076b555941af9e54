#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use prism::error::{PrismError, PrismResult};
use prism::prometheus::{
    InstantSample, Matrix, MetricsQuerier, RangeQueryOptions, Sample, TimeSeries, Vector,
};
use prism_api::k8s::{K8sClient, K8sError, PodPhase, PodSummary};

pub const MOCK_WORKLOAD: &str = "web";
pub const MOCK_PODS: [&str; 2] = ["web-0", "web-1"];
pub const MOCK_POD_CREATED_AT: i64 = 1_700_000_000;

/// Serves a fixed two pod Deployment without talking to a cluster.
pub struct MockK8sClient;

fn mock_pod(name: &str) -> PodSummary {
    PodSummary {
        name: name.to_string(),
        phase: PodPhase::Running,
        created_at_ts: MOCK_POD_CREATED_AT,
    }
}

#[async_trait]
impl K8sClient for MockK8sClient {
    async fn get_workload_pods(
        &self,
        _namespace: &str,
        workload: &str,
    ) -> Result<Vec<PodSummary>, K8sError> {
        if workload != MOCK_WORKLOAD {
            return Err(K8sError::WorkloadNotFound(workload.to_string()));
        }

        Ok(MOCK_PODS.iter().map(|name| mock_pod(name)).collect())
    }

    async fn get_pod(&self, _namespace: &str, pod: &str) -> Result<PodSummary, K8sError> {
        if !MOCK_PODS.contains(&pod) {
            return Err(K8sError::PodNotFound(pod.to_string()));
        }

        Ok(mock_pod(pod))
    }
}

/// Answers every query instantly with a deterministic series.
///
/// Range queries yield two samples at the start of the requested range;
/// instant queries yield a quarter of a core (or of a byte, for memory).
pub struct FakeQuerier;

#[async_trait]
impl MetricsQuerier for FakeQuerier {
    async fn range_query(&self, _query: &str, options: RangeQueryOptions) -> PrismResult<Matrix> {
        Ok(vec![TimeSeries {
            labels: BTreeMap::new(),
            samples: vec![
                Sample {
                    timestamp: options.start_ts,
                    value: 0.1,
                },
                Sample {
                    timestamp: options.start_ts + options.step_secs,
                    value: 0.2,
                },
            ],
        }])
    }

    async fn instant_query(&self, _query: &str, _at_ts: i64) -> PrismResult<Vector> {
        Ok(vec![InstantSample {
            labels: BTreeMap::new(),
            sample: Sample {
                timestamp: 0,
                value: 0.25,
            },
        }])
    }
}

/// Rejects every query the way a backend refusing a malformed expression
/// would.
pub struct FailingQuerier;

fn rejected() -> PrismError {
    PrismError::QueryRejected {
        error_type: "bad_data".to_string(),
        message: "invalid parameter".to_string(),
    }
}

#[async_trait]
impl MetricsQuerier for FailingQuerier {
    async fn range_query(&self, _query: &str, _options: RangeQueryOptions) -> PrismResult<Matrix> {
        Err(rejected())
    }

    async fn instant_query(&self, _query: &str, _at_ts: i64) -> PrismResult<Vector> {
        Err(rejected())
    }
}

/// Stalls every query long enough to trip the batch deadline.
pub struct SlowQuerier {
    pub delay: Duration,
}

#[async_trait]
impl MetricsQuerier for SlowQuerier {
    async fn range_query(&self, query: &str, options: RangeQueryOptions) -> PrismResult<Matrix> {
        tokio::time::sleep(self.delay).await;
        FakeQuerier.range_query(query, options).await
    }

    async fn instant_query(&self, query: &str, at_ts: i64) -> PrismResult<Vector> {
        tokio::time::sleep(self.delay).await;
        FakeQuerier.instant_query(query, at_ts).await
    }
}
