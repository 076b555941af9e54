use serde::{Deserialize, Serialize};

/// Connection settings for a Prometheus-compatible metrics backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConnectionConfig {
    /// Base URL of the Prometheus HTTP API, e.g. `http://prometheus:9090`.
    pub url: String,
    /// Timeout in seconds applied to each individual HTTP request.
    pub request_timeout_secs: u64,
}

/// Sentry error tracking and monitoring configuration.
///
/// Contains the DSN required to initialize Sentry for error tracking in
/// Prism services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryConfig {
    /// Sentry DSN (Data Source Name) for error reporting and monitoring.
    pub dsn: String,
}
