//! Request context types.
//!
//! The [`RequestContext`] carries per-request state from dispatch into
//! handlers.

use http::{Extensions, Method};
use serde::{Deserialize, Serialize};
use thales_router::Params;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines sortable by request.
///
/// ```
/// use thales_core::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID, e.g. one read from an inbound header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state handed to typed handlers by value.
///
/// Holds the request ID, the method and path as received, the path
/// parameters captured by the route, and whatever middleware stored in the
/// request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    params: Params,
    extensions: Extensions,
}

impl RequestContext {
    /// Creates a context with a fresh request ID and no extensions.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, params: Params) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            params,
            extensions: Extensions::new(),
        }
    }

    /// Replaces the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = id;
        self
    }

    /// Replaces the extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path parameters captured by the matched route.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// A single path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Values stored by middleware.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to the extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Shorthand for `extensions().get::<T>()`.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}
