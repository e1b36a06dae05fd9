//! HTTP request and response types used throughout the pipeline.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type the pipeline consumes.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type the pipeline produces.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;
