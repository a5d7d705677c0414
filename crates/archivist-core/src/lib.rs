//! archivist-core: Shared plumbing for the archivist crates.
//!
//! - `config/` - YAML loading, multi-file merging, and environment variable interpolation
//! - `metrics/` - Internal events emitted through the `metrics` facade
//! - `error` - Configuration error types
//! - `tracing` - Subscriber initialization for CLI applications

pub mod config;
pub mod error;
pub mod metrics;
pub mod tracing;

pub use config::{CliArgs, ConfigPath, Mergeable, interpolate, load_from_paths};
pub use error::ConfigError;
pub use crate::tracing::init_tracing;
