use std::sync::Arc;
use std::time::Duration;

use prism_telemetry::tracing::init_test_tracing;
use serde_json::Value;

use crate::support::mocks::{
    FailingQuerier, MOCK_POD_CREATED_AT, MOCK_PODS, MOCK_WORKLOAD, SlowQuerier,
};
use crate::support::test_app::{spawn_test_app, spawn_test_app_with_querier};

mod support;

#[tokio::test(flavor = "multi_thread")]
async fn workload_metrics_return_one_entry_per_pod() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app
        .get_workload_metrics(MOCK_WORKLOAD, "?start=1700000000&end=1700000060&step=15")
        .await;

    // Assert
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("failed to parse response");
    let pods = body.as_array().expect("expected an array");
    assert_eq!(pods.len(), MOCK_PODS.len());

    for (entry, expected_name) in pods.iter().zip(MOCK_PODS) {
        assert_eq!(entry["name"], expected_name);
        assert_eq!(entry["status"]["phase"], "Running");
        assert_eq!(entry["CreationTimestamp"], MOCK_POD_CREATED_AT);

        // The instant value of 0.25 cores is rendered as 250 millicores.
        assert_eq!(entry["cpuUsage"]["current"]["value"], 250.0);
        assert_eq!(entry["cpuUsage"]["current"]["unit"], "m");

        // Five grid points between 1700000000 and 1700000060 at 15s spacing,
        // with the second observed value carried forward.
        let cpu_samples = entry["cpuUsage"]["samples"]
            .as_array()
            .expect("expected cpu samples");
        assert_eq!(cpu_samples.len(), 5);
        assert_eq!(cpu_samples[0][0], 1_700_000_000);
        assert_eq!(cpu_samples[0][1], 100.0);
        assert_eq!(cpu_samples[4][0], 1_700_000_060);
        assert_eq!(cpu_samples[4][1], 200.0);

        assert_eq!(entry["memUsage"]["current"], 0.25);
        let mem_samples = entry["memUsage"]["samples"]
            .as_array()
            .expect("expected mem samples");
        assert_eq!(mem_samples.len(), 5);
        assert_eq!(mem_samples[0][1], 0.1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn workload_metrics_require_authentication() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app
        .api_client
        .get(format!(
            "{}/v1/workloads/{MOCK_WORKLOAD}/metrics",
            app.address
        ))
        .send()
        .await
        .expect("failed to execute request");

    // Assert
    assert_eq!(response.status(), 401);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_workload_returns_404() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.get_workload_metrics("missing", "").await;

    // Assert
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("failed to parse response");
    assert_eq!(body["error"], "The workload missing was not found");
}

#[tokio::test(flavor = "multi_thread")]
async fn inverted_time_range_returns_400() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app
        .get_workload_metrics(MOCK_WORKLOAD, "?start=1700000060&end=1700000000")
        .await;

    // Assert
    assert_eq!(response.status(), 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_backend_returns_502_with_a_generic_message() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app_with_querier(Arc::new(FailingQuerier), None).await;

    // Act
    let response = app.get_workload_metrics(MOCK_WORKLOAD, "").await;

    // Assert
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.expect("failed to parse response");
    // Backend internals stay out of the response body.
    assert_eq!(
        body["error"],
        "an error occurred while querying the metrics backend"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_backend_returns_504() {
    init_test_tracing();
    // Arrange
    let querier = Arc::new(SlowQuerier {
        delay: Duration::from_secs(5),
    });
    let app = spawn_test_app_with_querier(querier, Some(1)).await;

    // Act
    let response = app.get_workload_metrics(MOCK_WORKLOAD, "").await;

    // Assert
    assert_eq!(response.status(), 504);
}
