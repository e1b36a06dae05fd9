//! Logging setup for Thales services.
//!
//! The pipeline itself only emits `tracing` spans and events. This crate
//! installs a subscriber for them:
//!
//! - [`LogConfig`]: filter, output format and detail, loadable with serde
//! - [`init_logging`]: installs the global subscriber
//! - [`fields`]: field names of the per-request span
//! - [`log_request_complete!`] / [`log_request_error!`]: standard events

#![doc(html_root_url = "https://docs.rs/thales-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
