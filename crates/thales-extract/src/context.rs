//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] is what the binder reads from: path parameters,
//! the parsed query string, headers and the raw body.

use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use thales_router::Params;

/// Borrowed view of one request.
///
/// The query string is decoded once on construction. Repeated keys keep
/// every value; lookups return the first.
///
/// # Example
///
/// ```rust
/// use thales_extract::ExtractionContext;
/// use thales_router::Params;
/// use http::Request;
///
/// let (parts, ()) = Request::get("/users/123?page=2&page=3").body(()).unwrap().into_parts();
/// let params: Params = [("id", "123")].into_iter().collect();
///
/// let ctx = ExtractionContext::new(&parts, b"", &params);
/// assert_eq!(ctx.path_param("id"), Some("123"));
/// assert_eq!(ctx.query_param("page"), Some("2"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext<'a> {
    method: &'a Method,
    uri: &'a Uri,
    headers: &'a HeaderMap,
    body: &'a [u8],
    path_params: &'a Params,
    query: Vec<(String, String)>,
}

impl<'a> ExtractionContext<'a> {
    /// Creates a context over request parts, a buffered body and the
    /// parameters captured by routing.
    #[must_use]
    pub fn new(parts: &'a Parts, body: &'a [u8], path_params: &'a Params) -> Self {
        let query = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();
        Self {
            method: &parts.method,
            uri: &parts.uri,
            headers: &parts.headers,
            body,
            path_params,
            query,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        self.method
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// A path parameter captured by routing.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub const fn path_params(&self) -> &Params {
        self.path_params
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        self.headers
    }

    /// First value of a header, when it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request body.
    #[must_use]
    pub const fn body(&self) -> &[u8] {
        self.body
    }

    /// Checks if the request body is empty.
    #[must_use]
    pub const fn is_body_empty(&self) -> bool {
        self.body.is_empty()
    }
}
