use actix_web::{Responder, get, web};
use metrics_exporter_prometheus::PrometheusHandle;

// Exposes the service's own counters (batch runs, tasks, durations), not the
// workload metrics served under /v1.
#[utoipa::path(
    summary = "Service self-metrics",
    description = "Renders the internal metrics recorder in Prometheus text exposition format.",
    responses(
        (status = 200, description = "Current recorder state rendered successfully", body = String),
    ),
    tag = "Metrics"
)]
#[get("/metrics")]
pub(crate) async fn metrics(metrics_handle: web::ThinData<PrometheusHandle>) -> impl Responder {
    metrics_handle.render()
}
