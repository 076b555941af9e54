use std::time::Duration;

use actix_web::{
    Responder, get,
    web::{Data, Json, Path, Query},
};
use prism::concurrency::run;
use prism::prometheus::MetricsQuerier;

use crate::config::ApiConfig;
use crate::k8s::K8sClient;
use crate::routes::ErrorMessage;
use crate::routes::workloads::{MetricsError, MetricsParams, PodMetrics, resolve_params};
use crate::tasks::{PodUsage, apply_usage, build_usage_tasks};

#[utoipa::path(
    summary = "Pod metrics",
    description = "Returns CPU and memory usage for a single pod.",
    params(
        ("pod" = String, Path, description = "Name of the pod"),
        MetricsParams,
    ),
    responses(
        (status = 200, description = "Metrics returned successfully", body = PodMetrics),
        (status = 400, description = "Invalid time range", body = ErrorMessage),
        (status = 404, description = "Pod not found", body = ErrorMessage),
        (status = 502, description = "The metrics backend returned an error", body = ErrorMessage),
        (status = 504, description = "The metrics backend did not answer in time", body = ErrorMessage),
    ),
    tag = "Metrics",
    context_path = "/v1",
)]
#[get("/pods/{pod}/metrics")]
pub async fn get_pod_metrics(
    config: Data<ApiConfig>,
    k8s_client: Data<dyn K8sClient>,
    querier: Data<dyn MetricsQuerier>,
    pod: Path<String>,
    params: Query<MetricsParams>,
) -> Result<impl Responder, MetricsError> {
    let pod = pod.into_inner();
    let resolved = resolve_params(&params, &config.query)?;
    let query_timeout = Duration::from_secs(config.query.timeout_secs);

    let summary = k8s_client
        .get_pod(&config.kubernetes.namespace, &pod)
        .await?;

    // A single pod needs no per-pod fan-out; its four usage queries form
    // the whole batch.
    let mut usage = PodUsage::default();
    let tasks = build_usage_tasks(
        &config.kubernetes.namespace,
        &summary.name,
        querier.into_inner(),
        resolved,
    );
    run(query_timeout, tasks, &mut usage).await?;

    let mut metrics = PodMetrics::placeholder(&summary);
    apply_usage(&mut metrics, usage);

    Ok(Json(metrics))
}
