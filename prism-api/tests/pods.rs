use prism_telemetry::tracing::init_test_tracing;
use serde_json::Value;

use crate::support::mocks::MOCK_POD_CREATED_AT;
use crate::support::test_app::spawn_test_app;

mod support;

#[tokio::test(flavor = "multi_thread")]
async fn pod_metrics_return_a_single_entry() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app
        .get_pod_metrics("web-0", "?start=1700000000&end=1700000060&step=15")
        .await;

    // Assert
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("failed to parse response");
    assert_eq!(body["name"], "web-0");
    assert_eq!(body["status"]["phase"], "Running");
    assert_eq!(body["CreationTimestamp"], MOCK_POD_CREATED_AT);
    assert_eq!(body["cpuUsage"]["current"]["unit"], "m");
    assert_eq!(body["memUsage"]["current"], 0.25);
    assert_eq!(
        body["cpuUsage"]["samples"]
            .as_array()
            .expect("expected cpu samples")
            .len(),
        5
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_pod_returns_404() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.get_pod_metrics("missing", "").await;

    // Assert
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("failed to parse response");
    assert_eq!(body["error"], "The pod missing was not found");
}
