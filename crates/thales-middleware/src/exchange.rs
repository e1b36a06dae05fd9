//! Per-request state shared by middleware and the handler.
//!
//! An [`Exchange`] owns the buffered request and a [`ResponseWriter`]. Each
//! link of a chain receives `&mut Exchange`, so whatever one link stores in
//! the extensions or writes to the response is visible to the next.

use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use http::header::HeaderMap;
use http::request::Parts;
use http::{Method, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use thales_core::{RequestContext, RequestId};
use thales_router::Params;

use crate::types::{Request, Response};

/// Buffered response with commit tracking.
///
/// Headers may be changed until the status is committed; after that they are
/// frozen. Writing a body commits an implicit `200 OK`. Bodies are dropped
/// for `HEAD` requests and for statuses that cannot carry one (1xx, 204, 205,
/// 304).
#[derive(Debug, Default)]
pub struct ResponseWriter {
    pending: HeaderMap,
    sent: HeaderMap,
    status: Option<StatusCode>,
    body: BytesMut,
    head_request: bool,
}

impl ResponseWriter {
    fn new(head_request: bool) -> Self {
        Self {
            head_request,
            ..Self::default()
        }
    }

    /// Headers to send with the status. Changes after commit have no effect.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.pending
    }

    /// Headers that will be sent.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        if self.is_committed() {
            &self.sent
        } else {
            &self.pending
        }
    }

    /// Commits the status and headers.
    ///
    /// Returns `false`, logging a warning, when the response was already
    /// committed.
    pub fn write_head(&mut self, status: StatusCode) -> bool {
        if let Some(existing) = self.status {
            tracing::warn!(
                status = status.as_u16(),
                committed = existing.as_u16(),
                "response already committed, ignoring status"
            );
            return false;
        }
        self.status = Some(status);
        self.sent = std::mem::take(&mut self.pending);
        true
    }

    /// Appends to the body, committing `200 OK` first if needed.
    pub fn write(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        if self.body_allowed() {
            self.body.extend_from_slice(data);
        }
    }

    /// Returns true once a status has been committed.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Committed status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether bytes passed to [`write`](Self::write) reach the client.
    #[must_use]
    pub fn body_allowed(&self) -> bool {
        if self.head_request {
            return false;
        }
        self.status.map_or(true, status_allows_body)
    }

    /// Builds the response. An uncommitted writer becomes an empty `200 OK`.
    #[must_use]
    pub fn into_response(mut self) -> Response {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.sent;
        response
    }
}

/// Returns false for statuses that never carry a body.
#[must_use]
pub fn status_allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// A request in flight.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::StatusCode;
/// use http_body_util::Full;
/// use thales_middleware::Exchange;
///
/// # tokio_test::block_on(async {
/// let request = http::Request::post("/items").body(Full::new(Bytes::from("{}"))).unwrap();
/// let mut ex = Exchange::read(request).await;
/// assert_eq!(ex.body().as_ref(), b"{}");
///
/// ex.response_mut().write_head(StatusCode::CREATED);
/// assert_eq!(ex.into_response().status(), StatusCode::CREATED);
/// # });
/// ```
#[derive(Debug)]
pub struct Exchange {
    parts: Parts,
    body: Bytes,
    params: Params,
    request_id: RequestId,
    started_at: Instant,
    response: ResponseWriter,
}

impl Exchange {
    /// Creates an exchange over an already buffered request.
    #[must_use]
    pub fn new(parts: Parts, body: Bytes) -> Self {
        let head_request = parts.method == Method::HEAD;
        Self {
            parts,
            body,
            params: Params::new(),
            request_id: RequestId::new(),
            started_at: Instant::now(),
            response: ResponseWriter::new(head_request),
        }
    }

    /// Buffers the request body and creates an exchange.
    pub async fn read(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self::new(parts, body)
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Request head.
    #[must_use]
    pub const fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Buffered request body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path parameters captured by routing.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// A single path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Replaces the path parameters.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID, e.g. with one propagated by the caller.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Time since the exchange was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a value for later links and the handler.
    pub fn set_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.parts.extensions.insert(value);
    }

    /// Reads a stored value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.parts.extensions.get::<T>()
    }

    /// Removes a stored value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.parts.extensions.remove::<T>()
    }

    /// The response being built.
    #[must_use]
    pub const fn response(&self) -> &ResponseWriter {
        &self.response
    }

    /// Mutable access to the response being built.
    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Snapshot handed to typed handlers.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        RequestContext::new(self.parts.method.clone(), self.path(), self.params.clone())
            .with_request_id(self.request_id)
            .with_extensions(self.parts.extensions.clone())
    }

    /// Finishes the exchange.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}
