//! Configuration management for Prism services.
//!
//! Provides environment detection, hierarchical configuration loading from
//! YAML files with environment variable overrides, and shared configuration
//! types used across the workspace.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
