//! Client abstractions for a Prometheus-compatible metrics backend.
//!
//! Consumers should depend on the trait [`MetricsQuerier`] and avoid relying
//! on a specific transport. The default client, [`HttpPromClient`], talks to
//! the backend's HTTP API. Keeping the abstraction in [`base`] lets us swap
//! implementations in tests and environments without a live backend.

mod base;
mod http;
pub mod queries;
pub mod timeline;
mod types;

pub use base::*;
pub use http::*;
pub use types::*;
