//! Telemetry infrastructure for Prism services.
//!
//! Provides structured logging with environment-aware configuration,
//! rotating file output in production and pretty console output in
//! development.

pub mod tracing;

pub use tracing::{init_test_tracing, init_tracing};
