//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use thales_middleware::Response;

use crate::error::TestError;

/// A collected response with assertion helpers.
///
/// Assertions return `&Self` so they chain:
///
/// ```ignore
/// client.get("/users/1").send().await
///     .assert_status_code(200)
///     .assert_json_field("name", &json!("Ada"));
/// ```
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Collects a service response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body cannot be collected.
    pub async fn from_http(response: Response) -> Result<Self, TestError> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();
        Ok(Self::new(parts.status, parts.headers, body))
    }

    /// Builds a response from raw parts.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Status code as a number.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// A header as a string, if it is valid visible ASCII.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// The Content-Type header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Raw body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] when the body is not UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| TestError::BodyRead(e.to_string()))
    }

    /// Body decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] when the body does not decode as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics on mismatch.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {:?}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the status code by number.
    ///
    /// # Panics
    ///
    /// Panics on mismatch or an invalid code.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        match StatusCode::from_u16(expected) {
            Ok(status) => self.assert_status(status),
            Err(_) => panic!("invalid status code {expected}"),
        }
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("header '{name}' not found"));
        assert_eq!(actual, expected, "header '{name}'");
        self
    }

    /// Asserts that a header is absent.
    ///
    /// # Panics
    ///
    /// Panics if the header is present.
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert!(
            self.header(name).is_none(),
            "header '{name}' should be absent, got {:?}",
            self.header(name)
        );
        self
    }

    /// Asserts that Content-Type starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or differs.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type not found, expected '{expected}'"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body is empty.
    ///
    /// # Panics
    ///
    /// Panics if any body bytes were written.
    pub fn assert_empty_body(&self) -> &Self {
        assert!(
            self.body.is_empty(),
            "expected empty body, got {:?}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the body contains `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the substring is missing.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(expected),
            "body should contain '{expected}', got: {body}"
        );
        self
    }

    /// Asserts the exact body text.
    ///
    /// # Panics
    ///
    /// Panics on mismatch.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        assert_eq!(String::from_utf8_lossy(&self.body), expected.as_ref(), "body mismatch");
        self
    }

    /// Asserts the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs.
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        let actual = self.json_or_panic();
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts a JSON field addressed by a dotted path such as `user.tags.0`.
    ///
    /// # Panics
    ///
    /// Panics if the field is missing or differs.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &serde_json::Value) -> &Self {
        let path = path.as_ref();
        let json = self.json_or_panic();
        let actual =
            json_path(&json, path).unwrap_or_else(|| panic!("JSON path '{path}' not found in {json}"));
        assert_eq!(actual, expected, "JSON field '{path}'");
        self
    }

    fn json_or_panic(&self) -> serde_json::Value {
        self.json().unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({e}): {:?}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        serde_json::Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        other => other.get(segment),
    })
}
