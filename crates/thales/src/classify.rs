//! Error classification and the default error responses.
//!
//! Every failure reaching a route is turned into either a typed response
//! (the error value is its own body) or a classified [`Error`] handed to the
//! error handler. Without a handler the classified error is written as
//! `text/plain` with the kind's default status.

use std::any::TypeId;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use thales_core::{BoxError, Error, ErrorBody, ErrorKind, Failure};
use thales_extract::{project_value, Projection};
use thales_middleware::Exchange;
use thales_telemetry::fields;
use tracing::{debug, error, warn, Span};

use crate::config::{ErrorHandler, RouterConfig};

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const ENCODE_ERROR: &str = "failed to encode error response";

/// How one route answers failures.
#[derive(Clone)]
pub(crate) struct ErrorPolicy {
    strict: bool,
    declared: Vec<TypeId>,
    handler: Option<ErrorHandler>,
}

impl ErrorPolicy {
    pub(crate) fn new(config: &RouterConfig, declared: Vec<TypeId>) -> Self {
        Self {
            strict: config.strict_error_types,
            declared,
            handler: config.error_handler.clone(),
        }
    }

    fn is_declared(&self, body: &dyn ErrorBody) -> bool {
        self.declared.contains(&body.body_type())
    }

    /// Hands a classified error to the error handler, or writes the default
    /// response.
    pub(crate) fn fail(&self, ex: &mut Exchange, err: Error) {
        Span::current().record(fields::ERROR_KIND, err.kind().as_str());
        if ex.response().is_committed() {
            error!(
                request_id = %ex.request_id(),
                error_kind = %err.kind(),
                error = %err,
                "failure after response was committed"
            );
        } else if err.kind().is_client_error() {
            debug!(error_kind = %err.kind(), error = %err, "request rejected");
        } else {
            thales_telemetry::log_request_error!(ex.request_id(), err.kind(), err);
        }
        match &self.handler {
            Some(handler) => handler(ex, err),
            None => write_default_error(ex, &err),
        }
    }

    /// Classifies a failure returned by the typed handler.
    pub(crate) fn handler_failure(&self, ex: &mut Exchange, failure: Failure) {
        let body = match failure {
            Failure::Opaque(source) => {
                return self.fail(
                    ex,
                    Error::new(ErrorKind::Handler, "handler returned an error").with_source(source),
                );
            }
            Failure::Typed(body) => body,
        };

        if self.is_declared(body.as_ref()) {
            return self.checked_typed(ex, body);
        }

        if self.strict {
            let message = format!(
                "handler returned undeclared error type: {}",
                body.body_type_name()
            );
            return self.fail(
                ex,
                Error::new(ErrorKind::UndeclaredError, message).with_source(body.into_boxed_error()),
            );
        }

        warn!(
            error_type = body.body_type_name(),
            error = %body,
            "handler returned undeclared error type"
        );
        if self.handler.is_some() {
            self.fail(
                ex,
                Error::new(ErrorKind::Handler, "handler returned an error")
                    .with_source(body.into_boxed_error()),
            );
        } else {
            self.write_typed(ex, body.as_ref());
        }
    }

    /// Classifies a failure returned by middleware. Typed failures are
    /// written as their own response once they pass their constraints.
    pub(crate) fn middleware_failure(&self, ex: &mut Exchange, failure: Failure) {
        match failure {
            Failure::Typed(body) => self.checked_typed(ex, body),
            Failure::Opaque(source) => self.fail(
                ex,
                Error::new(ErrorKind::Handler, "handler returned an error").with_source(source),
            ),
        }
    }

    fn checked_typed(&self, ex: &mut Exchange, body: Box<dyn ErrorBody>) {
        match body.check() {
            Ok(()) => self.write_typed(ex, body.as_ref()),
            Err(violations) => self.fail(
                ex,
                Error::new(ErrorKind::ErrorValidation, "error response validation failed")
                    .with_source(violations),
            ),
        }
    }

    fn write_typed(&self, ex: &mut Exchange, body: &dyn ErrorBody) {
        let projection = body
            .descriptor()
            .map_err(|e| encode_error(ENCODE_ERROR, e))
            .and_then(|desc| {
                let value = body.to_json().map_err(|e| encode_error(ENCODE_ERROR, e))?;
                project_value(value, &desc).map_err(|e| encode_error(ENCODE_ERROR, e))
            });
        match projection {
            Ok(projection) => self.write_projection(
                ex,
                projection,
                StatusCode::INTERNAL_SERVER_ERROR,
                ENCODE_ERROR,
            ),
            Err(err) => self.fail(ex, err),
        }
    }

    /// Writes a projected value: declared status or `default_status`,
    /// header fields, and the JSON body unless the status or method forbids
    /// one.
    pub(crate) fn write_projection(
        &self,
        ex: &mut Exchange,
        projection: Projection,
        default_status: StatusCode,
        encode_message: &'static str,
    ) {
        let status = projection
            .status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(default_status);
        let body = match serde_json::to_vec(&projection.body) {
            Ok(body) => body,
            Err(e) => return self.fail(ex, encode_error(encode_message, e)),
        };

        let response = ex.response_mut();
        let headers = response.headers_mut();
        headers.extend(projection.headers);
        if thales_middleware::status_allows_body(status) && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        if response.write_head(status) {
            response.write(&body);
        }
    }
}

fn encode_error(message: &'static str, source: impl Into<BoxError>) -> Error {
    Error::new(ErrorKind::Serialization, message).with_source(source)
}

/// Writes `err` as `text/plain` with its default status.
///
/// The body is the error's display string followed by a newline. Nothing is
/// written when the response was already committed.
pub fn write_default_error(ex: &mut Exchange, err: &Error) {
    let response = ex.response_mut();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    if response.write_head(err.status_code()) {
        response.write(format!("{err}\n").as_bytes());
    }
}
