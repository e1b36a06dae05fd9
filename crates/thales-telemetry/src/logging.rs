//! Structured logging for Thales services.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! JSON or pretty output. Dispatch already emits `request` spans and
//! classification events; this module only decides where they go.
//!
//! # Example
//!
//! ```rust,ignore
//! use thales_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(route = "/users/{id}", "router frozen");
//! ```

use serde::Deserialize;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive, e.g. `"info"` or `"thales=debug,warn"`.
    pub level: String,

    /// JSON lines instead of human-readable output.
    pub json_format: bool,

    /// Emit span open and close events.
    pub span_events: bool,

    /// Include file and line.
    pub file_line_info: bool,

    /// Include the event target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable debug output with span events.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Fails when the filter does not parse or a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let result = if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);
        tracing_subscriber::registry().with(fmt_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);
        tracing_subscriber::registry().with(fmt_layer).try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the directive is malformed.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Field names of the per-request span. Route, status, error kind and
/// duration start empty and are recorded as dispatch proceeds.
pub mod fields {
    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// HTTP method.
    pub const HTTP_METHOD: &str = "method";

    /// Request path.
    pub const HTTP_PATH: &str = "path";

    /// Response status code.
    pub const HTTP_STATUS: &str = "status";

    /// Registered route pattern.
    pub const ROUTE: &str = "route";

    /// Classified error kind.
    pub const ERROR_KIND: &str = "error_kind";

    /// Duration in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";
}

/// Logs a completed request.
#[macro_export]
macro_rules! log_request_complete {
    ($request_id:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            request_id = %$request_id,
            status = $status,
            duration_ms = $duration_ms,
            "request completed"
        );
    };
}

/// Logs a classified pipeline error.
#[macro_export]
macro_rules! log_request_error {
    ($request_id:expr, $kind:expr, $error:expr) => {
        tracing::error!(
            request_id = %$request_id,
            error_kind = %$kind,
            error = %$error,
            "request failed"
        );
    };
}
