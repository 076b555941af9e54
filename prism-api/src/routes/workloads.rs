use std::time::Duration;

use actix_web::{
    HttpResponse, Responder, ResponseError, get,
    http::{StatusCode, header::ContentType},
    web::{Data, Json, Path, Query},
};
use chrono::Utc;
use prism::concurrency::{FetchTask, run};
use prism::error::PrismError;
use prism::prometheus::MetricsQuerier;
use prism::prometheus::timeline::adaptive_step;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::config::{ApiConfig, QuerySettings};
use crate::k8s::{K8sClient, K8sError, PodSummary};
use crate::routes::ErrorMessage;
use crate::tasks::{CPU_UNIT_CORE, PodMetricsTask, ResolvedParams};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("The end time must be greater than the start time")]
    InvalidTimeRange,

    #[error("The request timed out while querying the metrics backend")]
    QueryTimeout,

    #[error("A K8s error occurred: {0}")]
    K8s(#[from] K8sError),

    #[error(transparent)]
    Engine(PrismError),
}

impl From<PrismError> for MetricsError {
    fn from(error: PrismError) -> Self {
        // The deadline sentinel keeps its meaning even when it bubbled up
        // from a nested batch wrapped in a task failure.
        if error.is_batch_timeout() {
            MetricsError::QueryTimeout
        } else {
            MetricsError::Engine(error)
        }
    }
}

impl MetricsError {
    pub fn to_message(&self) -> String {
        match self {
            // Do not expose backend internals in error messages.
            MetricsError::Engine(_) => {
                "an error occurred while querying the metrics backend".to_string()
            }
            MetricsError::K8s(K8sError::Kube(_) | K8sError::Serde(_)) => {
                "internal server error".to_string()
            }
            MetricsError::K8s(e) => e.to_string(),
            e => e.to_string(),
        }
    }
}

impl ResponseError for MetricsError {
    fn status_code(&self) -> StatusCode {
        match self {
            MetricsError::InvalidTimeRange => StatusCode::BAD_REQUEST,
            MetricsError::QueryTimeout => StatusCode::GATEWAY_TIMEOUT,
            MetricsError::Engine(_) => StatusCode::BAD_GATEWAY,
            MetricsError::K8s(K8sError::WorkloadNotFound(_) | K8sError::PodNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            MetricsError::K8s(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_message(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MetricsParams {
    /// Inclusive range start as a unix timestamp in seconds. Defaults to one
    /// default range before `end`.
    pub start: Option<i64>,
    /// Inclusive range end as a unix timestamp in seconds. Defaults to now
    /// and is clamped to now.
    pub end: Option<i64>,
    /// Sample spacing in seconds. Chosen adaptively when omitted or not
    /// positive.
    pub step: Option<i64>,
    /// Rate window in seconds for counter queries.
    pub duration: Option<i64>,
}

pub(crate) fn resolve_params(
    params: &MetricsParams,
    settings: &QuerySettings,
) -> Result<ResolvedParams, MetricsError> {
    let now = Utc::now().timestamp();
    let end_ts = params.end.unwrap_or(now).min(now);
    let start_ts = params.start.unwrap_or(end_ts - settings.default_range_secs);

    if start_ts >= end_ts {
        return Err(MetricsError::InvalidTimeRange);
    }

    let step_secs = adaptive_step(start_ts, end_ts, params.step.unwrap_or(0));
    let window_secs = params
        .duration
        .filter(|duration| *duration > 0)
        .unwrap_or(settings.default_window_secs);

    Ok(ResolvedParams {
        start_ts,
        end_ts,
        step_secs,
        window_secs,
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PodMetrics {
    #[schema(example = "web-7f9c6d5b4-x2x7l")]
    pub name: String,
    pub status: PodStatusView,
    #[serde(rename = "cpuUsage")]
    pub cpu_usage: CpuUsageView,
    #[serde(rename = "memUsage")]
    pub mem_usage: MemUsageView,
    #[serde(rename = "CreationTimestamp")]
    #[schema(example = 1700000000)]
    pub creation_timestamp: i64,
}

impl PodMetrics {
    /// Builds the response entry for one pod with empty usage. The usage
    /// fields are filled later by the pod's merge.
    pub fn placeholder(pod: &PodSummary) -> PodMetrics {
        PodMetrics {
            name: pod.name.clone(),
            status: PodStatusView {
                phase: pod.phase.to_string(),
            },
            cpu_usage: CpuUsageView::default(),
            mem_usage: MemUsageView::default(),
            creation_timestamp: pod.created_at_ts,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PodStatusView {
    #[schema(example = "Running")]
    pub phase: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CpuUsageView {
    pub current: CpuMeasurement,
    /// `[timestamp, value]` pairs, values in millicores.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub samples: Vec<(i64, f64)>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MemUsageView {
    /// Current memory usage in bytes.
    #[schema(example = 104857600.0)]
    pub current: f64,
    /// `[timestamp, value]` pairs, values in bytes.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub samples: Vec<(i64, f64)>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CpuMeasurement {
    #[schema(example = 250.0)]
    pub value: f64,
    #[schema(example = "m")]
    pub unit: String,
}

impl Default for CpuMeasurement {
    fn default() -> CpuMeasurement {
        CpuMeasurement {
            value: 0.0,
            unit: CPU_UNIT_CORE.to_string(),
        }
    }
}

#[utoipa::path(
    summary = "Workload pod metrics",
    description = "Returns CPU and memory usage for every pod backing the workload's Deployment.",
    params(
        ("workload" = String, Path, description = "Name of the workload's Deployment"),
        MetricsParams,
    ),
    responses(
        (status = 200, description = "Metrics returned successfully", body = Vec<PodMetrics>),
        (status = 400, description = "Invalid time range", body = ErrorMessage),
        (status = 404, description = "Workload not found", body = ErrorMessage),
        (status = 502, description = "The metrics backend returned an error", body = ErrorMessage),
        (status = 504, description = "The metrics backend did not answer in time", body = ErrorMessage),
    ),
    tag = "Metrics",
    context_path = "/v1",
)]
#[get("/workloads/{workload}/metrics")]
pub async fn get_workload_metrics(
    config: Data<ApiConfig>,
    k8s_client: Data<dyn K8sClient>,
    querier: Data<dyn MetricsQuerier>,
    workload: Path<String>,
    params: Query<MetricsParams>,
) -> Result<impl Responder, MetricsError> {
    let workload = workload.into_inner();
    let resolved = resolve_params(&params, &config.query)?;
    let query_timeout = Duration::from_secs(config.query.timeout_secs);

    let pods = k8s_client
        .get_workload_pods(&config.kubernetes.namespace, &workload)
        .await?;

    // The response array is pre-partitioned so each task writes only its
    // own slot during merge.
    let mut sink: Vec<PodMetrics> = pods.iter().map(PodMetrics::placeholder).collect();
    let tasks: Vec<Box<dyn FetchTask<Vec<PodMetrics>>>> = pods
        .iter()
        .enumerate()
        .map(|(slot, pod)| {
            Box::new(PodMetricsTask {
                namespace: config.kubernetes.namespace.clone(),
                pod: pod.name.clone(),
                slot,
                querier: querier.clone().into_inner(),
                params: resolved,
                query_timeout,
            }) as Box<dyn FetchTask<Vec<PodMetrics>>>
        })
        .collect();

    run(query_timeout, tasks, &mut sink).await?;

    Ok(Json(sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> QuerySettings {
        QuerySettings {
            timeout_secs: 60,
            default_range_secs: 3_600,
            default_window_secs: 180,
        }
    }

    fn params(start: Option<i64>, end: Option<i64>) -> MetricsParams {
        MetricsParams {
            start,
            end,
            step: None,
            duration: None,
        }
    }

    #[test]
    fn missing_start_defaults_to_one_range_before_end() {
        let now = Utc::now().timestamp();
        let resolved = resolve_params(&params(None, Some(now)), &settings()).unwrap();
        assert_eq!(resolved.end_ts, now);
        assert_eq!(resolved.start_ts, now - 3_600);
        assert_eq!(resolved.window_secs, 180);
    }

    #[test]
    fn future_end_is_clamped_to_now() {
        let now = Utc::now().timestamp();
        let resolved = resolve_params(&params(Some(now - 60), Some(now + 3_600)), &settings())
            .unwrap();
        assert!(resolved.end_ts <= Utc::now().timestamp());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let now = Utc::now().timestamp();
        let result = resolve_params(&params(Some(now), Some(now - 60)), &settings());
        assert!(matches!(result, Err(MetricsError::InvalidTimeRange)));
    }

    #[test]
    fn non_positive_step_is_chosen_adaptively() {
        let now = Utc::now().timestamp();
        let mut request = params(Some(now - 3_600), Some(now));
        request.step = Some(-5);
        let resolved = resolve_params(&request, &settings()).unwrap();
        assert_eq!(resolved.step_secs, 15);
    }

    #[test]
    fn timeout_sentinel_maps_to_gateway_timeout() {
        let error = MetricsError::from(PrismError::BatchTimeout);
        assert_eq!(error.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let wrapped = PrismError::Acquire {
            key: "web-0".to_string(),
            source: Box::new(PrismError::BatchTimeout),
        };
        let error = MetricsError::from(wrapped);
        assert_eq!(error.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
