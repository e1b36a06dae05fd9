//! Classified pipeline errors.
//!
//! Every failure the pipeline produces is normalized into an [`Error`] that
//! carries an [`ErrorKind`], a fixed message and, when there is one, the
//! underlying cause. Custom error handlers match on the kind; the default
//! handler maps it to a status code.
//!
//! | Kind | `as_str` | Default status |
//! |---|---|---|
//! | `Parse` | `parse_error` | 400 |
//! | `Validation` | `validation_error` | 400 |
//! | `Handler` | `handler_error` | 500 |
//! | `UndeclaredError` | `undeclared_error_type` | 500 |
//! | `ErrorValidation` | `error_validation_error` | 500 |
//! | `ResponseValidation` | `response_validation_error` | 500 |
//! | `Serialization` | `serialization_error` | 500 |
//! | `NotFound` | `not_found` | 404 |
//! | `MethodNotAllowed` | `method_not_allowed` | 405 |

use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thales_router::RouteError;
use thiserror::Error;

use crate::schema::SchemaError;

/// Boxed error used for causes and opaque handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stage of the pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A path, query or header value did not convert, or the body was not JSON.
    #[serde(rename = "parse_error")]
    Parse,
    /// The bound request broke its constraints.
    #[serde(rename = "validation_error")]
    Validation,
    /// A handler or middleware failed with an error that has no body of its own.
    #[serde(rename = "handler_error")]
    Handler,
    /// A typed error was returned that the route never declared.
    #[serde(rename = "undeclared_error_type")]
    UndeclaredError,
    /// A typed error broke its own constraints.
    #[serde(rename = "error_validation_error")]
    ErrorValidation,
    /// The success value broke its constraints.
    #[serde(rename = "response_validation_error")]
    ResponseValidation,
    /// A value could not be encoded as JSON.
    #[serde(rename = "serialization_error")]
    Serialization,
    /// No route matched the path.
    #[serde(rename = "not_found")]
    NotFound,
    /// The path matched but the method did not.
    #[serde(rename = "method_not_allowed")]
    MethodNotAllowed,
}

impl ErrorKind {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse_error",
            Self::Validation => "validation_error",
            Self::Handler => "handler_error",
            Self::UndeclaredError => "undeclared_error_type",
            Self::ErrorValidation => "error_validation_error",
            Self::ResponseValidation => "response_validation_error",
            Self::Serialization => "serialization_error",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
        }
    }

    /// Status the default error handler answers with.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Parse | Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Handler
            | Self::UndeclaredError
            | Self::ErrorValidation
            | Self::ResponseValidation
            | Self::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for kinds caused by the client rather than the service.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.default_status_code().is_client_error()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified pipeline failure.
///
/// Displays as `"{kind}: {message}"`, followed by `": {cause}"` when a cause
/// is attached.
///
/// ```
/// use thales_core::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::Parse, "invalid query parameter 'page'")
///     .with_source("invalid digit found in string");
/// assert_eq!(
///     err.to_string(),
///     "parse_error: invalid query parameter 'page': invalid digit found in string"
/// );
/// ```
#[derive(Debug, Error)]
#[error("{kind}: {message}{}", .source.as_ref().map(|s| format!(": {s}")).unwrap_or_default())]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error without a cause.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// `route not found: METHOD PATH`.
    #[must_use]
    pub fn not_found(method: &Method, path: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("route not found: {method} {path}"))
    }

    /// `method not allowed: METHOD PATH`.
    #[must_use]
    pub fn method_not_allowed(method: &Method, path: &str) -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed,
            format!("method not allowed: {method} {path}"),
        )
    }

    /// Classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message without kind or cause.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status the default handler uses.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.default_status_code()
    }

    /// Returns the cause as `T` when it is one.
    ///
    /// Typed handler errors that reach an error handler are attached as the
    /// cause, so this is how a handler recovers them.
    #[must_use]
    pub fn downcast_source<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.source.as_deref().and_then(|s| s.downcast_ref::<T>())
    }

    /// Takes the cause out.
    #[must_use]
    pub fn into_source(self) -> Option<BoxError> {
        self.source
    }
}

/// A registration that cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A request, response or error type has an unusable description.
    #[error("invalid type description: {0}")]
    Schema(#[from] SchemaError),

    /// The route trie refused the pattern.
    #[error("invalid route: {0}")]
    Route(#[from] RouteError),

    /// A path or prefix could not be normalized.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// Offending path.
        path: String,
        /// What is wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("teapot")]
    struct Teapot;

    #[test]
    fn test_kind_strings() {
        assert_eq!(ErrorKind::UndeclaredError.as_str(), "undeclared_error_type");
        assert_eq!(ErrorKind::ErrorValidation.to_string(), "error_validation_error");
        assert_eq!(
            serde_json::to_string(&ErrorKind::ResponseValidation).unwrap(),
            "\"response_validation_error\""
        );
        let kind: ErrorKind = serde_json::from_str("\"method_not_allowed\"").unwrap();
        assert_eq!(kind, ErrorKind::MethodNotAllowed);
    }

    #[test]
    fn test_default_status_mapping() {
        assert_eq!(ErrorKind::Parse.default_status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Validation.default_status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.default_status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::MethodNotAllowed.default_status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        for kind in [
            ErrorKind::Handler,
            ErrorKind::UndeclaredError,
            ErrorKind::ErrorValidation,
            ErrorKind::ResponseValidation,
            ErrorKind::Serialization,
        ] {
            assert_eq!(kind.default_status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!kind.is_client_error());
        }
    }

    #[test]
    fn test_display_without_source() {
        let err = Error::not_found(&Method::GET, "/missing");
        assert_eq!(err.to_string(), "not_found: route not found: GET /missing");
        assert_eq!(err.message(), "route not found: GET /missing");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;
        let err = Error::new(ErrorKind::Handler, "handler returned an error").with_source(Teapot);
        assert_eq!(err.to_string(), "handler_error: handler returned an error: teapot");
        assert!(err.source().is_some());
        assert!(err.downcast_source::<Teapot>().is_some());
        assert!(err.downcast_source::<std::fmt::Error>().is_none());
    }

    #[test]
    fn test_setup_error_wraps_route_error() {
        let err: SetupError = RouteError::WildcardNotLast {
            path: "/a/*b/c".into(),
        }
        .into();
        assert!(matches!(err, SetupError::Route(_)));
        assert!(err.to_string().starts_with("invalid route: "));
    }
}
