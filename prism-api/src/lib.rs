//! Management-plane API serving workload and pod usage metrics.
//!
//! Provides a REST API that resolves a workload's pods through Kubernetes and
//! renders their CPU and memory usage from a Prometheus-compatible backend.
//! Backend queries are fanned out through the batch executor in the `prism`
//! crate under a single deadline per request. Includes authentication,
//! structured tracing, and OpenAPI documentation.

pub mod authentication;
pub mod config;
pub mod k8s;
pub mod metrics;
pub mod routes;
pub mod startup;
pub mod tasks;
