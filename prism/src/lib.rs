pub mod concurrency;
pub mod error;
pub mod metrics;
pub mod prometheus;
