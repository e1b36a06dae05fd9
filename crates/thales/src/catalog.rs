//! Route catalog for schema generators.
//!
//! Every registration produces a [`RouteRecord`]. Document generators read
//! the catalog from a [`Router`](crate::Router) or a frozen
//! [`Service`](crate::Service); nothing here renders documents.

use std::sync::Arc;

use http::Method;
use serde::Serialize;
use thales_core::{FieldSource, TypeDescriptor};

/// One registered operation.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// HTTP method.
    pub method: Method,
    /// Normalized route pattern, e.g. `/api/users/{id}`.
    pub path: String,
    /// Identifier derived from method and path, e.g. `getApiUsersById`.
    pub operation_id: String,
    /// Pattern with wildcards in OpenAPI form, e.g. `/files/{rest}`.
    pub openapi_path: String,
    /// Request type.
    pub request: Arc<TypeDescriptor>,
    /// Success response type.
    pub response: Arc<TypeDescriptor>,
    /// Declared error types.
    pub errors: Vec<Arc<TypeDescriptor>>,
    /// Path, query and header inputs of the request type.
    pub params: Vec<ParamRecord>,
}

/// A non-body request input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamRecord {
    /// Parameter name as it appears in the request.
    pub name: String,
    /// `path`, `query` or `header`.
    pub location: &'static str,
    /// Path parameters are always required.
    pub required: bool,
}

impl RouteRecord {
    pub(crate) fn new(
        method: Method,
        path: String,
        request: Arc<TypeDescriptor>,
        response: Arc<TypeDescriptor>,
        errors: Vec<Arc<TypeDescriptor>>,
    ) -> Self {
        let params = request
            .params()
            .into_iter()
            .filter_map(|field| {
                let name = field.source.param_name()?;
                Some(ParamRecord {
                    name: name.to_string(),
                    location: field.source.location(),
                    required: field.required || matches!(field.source, FieldSource::Path(_)),
                })
            })
            .collect();
        Self {
            operation_id: operation_id(&method, &path),
            openapi_path: openapi_path(&path),
            method,
            path,
            request,
            response,
            errors,
            params,
        }
    }

    /// Status of a successful response.
    #[must_use]
    pub fn success_status(&self) -> u16 {
        self.response.effective_status().unwrap_or(200)
    }
}

/// Builds an operation id: the lowercase method followed by each segment
/// capitalized, with parameters introduced by `By`.
///
/// ```
/// use http::Method;
/// use thales::catalog::operation_id;
///
/// assert_eq!(operation_id(&Method::GET, "/users/{id}"), "getUsersById");
/// assert_eq!(operation_id(&Method::POST, "/order-items"), "postOrderItems");
/// ```
#[must_use]
pub fn operation_id(method: &Method, path: &str) -> String {
    let mut id = method.as_str().to_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match param_name(segment) {
            Some(name) => {
                id.push_str("By");
                id.push_str(&camel(name));
            }
            None => id.push_str(&camel(segment)),
        }
    }
    id
}

/// Rewrites `*rest` wildcards as `{rest}`. Named parameters are kept.
#[must_use]
pub fn openapi_path(path: &str) -> String {
    let rewritten: Vec<String> = path
        .split('/')
        .map(|segment| match segment.strip_prefix('*') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect();
    rewritten.join("/")
}

fn param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .or_else(|| segment.strip_prefix('*'))
}

fn camel(segment: &str) -> String {
    segment
        .split(['-', '_', '.'])
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}
