//! JSON projection of response and error values.
//!
//! Projection turns a serialized value into what goes on the wire: response
//! headers pulled from header fields, and a body with routing-only fields
//! removed, unions packed, empty optional fields dropped and envelopes
//! unwrapped.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use thales_core::{FieldDescriptor, FieldSource, TypeDescriptor};

use crate::error::ProjectError;
use crate::union::encode_unions;

/// Wire form of a response or error value.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Status declared by the type or an embedded type.
    pub status: Option<u16>,
    /// Headers taken from non-empty header fields.
    pub headers: HeaderMap,
    /// JSON body.
    pub body: Value,
}

/// Serializes `value` and projects it with `desc`.
///
/// # Example
///
/// ```rust
/// use serde::Serialize;
/// use thales_core::{descriptor_of, Schema, SchemaBuilder};
/// use thales_extract::project;
///
/// #[derive(Serialize)]
/// struct Created {
///     id: u64,
///     location: String,
///     note: Option<String>,
/// }
///
/// impl Schema for Created {
///     fn describe(schema: &mut SchemaBuilder) {
///         schema.status(201);
///         schema.header::<String>("location", "Location");
///         schema.field("note").optional().omit_empty();
///     }
/// }
///
/// let out = project(
///     &Created { id: 7, location: "/things/7".into(), note: None },
///     &descriptor_of::<Created>().unwrap(),
/// )
/// .unwrap();
/// assert_eq!(out.status, Some(201));
/// assert_eq!(out.headers["location"], "/things/7");
/// assert_eq!(out.body, serde_json::json!({"id": 7}));
/// ```
pub fn project<T: Serialize + ?Sized>(value: &T, desc: &TypeDescriptor) -> Result<Projection, ProjectError> {
    project_value(serde_json::to_value(value)?, desc)
}

/// Projects an already serialized value.
///
/// Values that do not serialize to an object pass through unchanged.
pub fn project_value(value: Value, desc: &TypeDescriptor) -> Result<Projection, ProjectError> {
    let status = desc.effective_status();
    let Value::Object(mut map) = value else {
        return Ok(Projection {
            status,
            headers: HeaderMap::new(),
            body: value,
        });
    };

    let fields = desc.flattened_fields();
    let mut headers = HeaderMap::new();

    for field in &fields {
        match &field.source {
            FieldSource::Body => {}
            FieldSource::Header(name) => {
                if let Some(value) = map.remove(&field.key) {
                    if !holds_empty(field, &value) {
                        insert_header(&mut headers, name, &value)?;
                    }
                }
            }
            FieldSource::Path(_) | FieldSource::Query(_) | FieldSource::Skip => {
                map.remove(&field.key);
            }
        }
    }

    encode_unions(&mut map, &desc.flattened_unions());

    for field in fields.iter().filter(|f| f.omit_empty) {
        if map.get(&field.key).is_some_and(|v| holds_empty(field, v)) {
            map.remove(&field.key);
        }
    }

    let body = match desc.unwrap_field() {
        Some(field) => map.remove(&field.key).unwrap_or(Value::Null),
        None => Value::Object(map),
    };

    Ok(Projection { status, headers, body })
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &Value) -> Result<(), ProjectError> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_json::to_string(other)?,
    };
    let invalid = || ProjectError::InvalidHeader { name: name.to_string() };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let header_value = HeaderValue::from_str(&text).map_err(|_| invalid())?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// Zero value of the field's declared type: `None` for optional fields,
/// [`is_zero`] for the rest.
fn holds_empty(field: &FieldDescriptor, value: &Value) -> bool {
    if field.optional {
        value.is_null()
    } else {
        is_zero(value)
    }
}

/// Returns true for values an omit-empty field drops: `null`, `false`, `0`,
/// `""`, `[]`, `{}` and objects whose values are all zero.
#[must_use]
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.values().all(is_zero),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use thales_core::{descriptor_of, Schema, SchemaBuilder, UnionSpec};

    #[derive(Serialize)]
    struct ErrorBase {
        code: String,
        message: String,
        trace_id: String,
    }

    impl Schema for ErrorBase {
        fn describe(schema: &mut SchemaBuilder) {
            schema.status(404);
            schema.header::<String>("trace_id", "X-Trace-Id");
        }
    }

    #[derive(Serialize)]
    struct NotFoundError {
        #[serde(flatten)]
        base: ErrorBase,
        resource: String,
    }

    impl Schema for NotFoundError {
        fn describe(schema: &mut SchemaBuilder) {
            schema.embed::<ErrorBase>("base");
            schema.field("resource").omit_empty();
        }
    }

    #[derive(Serialize)]
    struct UserResponse {
        id: String,
        page: u32,
        secret: String,
        etag: String,
    }

    impl Schema for UserResponse {
        fn describe(schema: &mut SchemaBuilder) {
            schema.path::<String>("id", "id");
            schema.query::<u32>("page", "page");
            schema.skip("secret");
            schema.header::<String>("etag", "ETag");
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Shape {
        Circle { radius: f64 },
    }

    #[derive(Serialize)]
    struct ShapeResponse {
        name: String,
        shape: Option<Shape>,
    }

    impl Schema for ShapeResponse {
        fn describe(schema: &mut SchemaBuilder) {
            schema.union("shape", UnionSpec::new("type", "properties").variant("circle"));
        }
    }

    #[derive(Serialize)]
    struct ListResponse {
        items: Option<Vec<u32>>,
        total: u32,
    }

    impl Schema for ListResponse {
        fn describe(schema: &mut SchemaBuilder) {
            schema.unwrap("items");
        }
    }

    #[derive(Serialize)]
    struct Counter {
        count: Option<i64>,
        label: Option<String>,
        hits: i64,
        retry_after: Option<u32>,
    }

    impl Schema for Counter {
        fn describe(schema: &mut SchemaBuilder) {
            schema.field("count").optional().omit_empty();
            schema.field("label").optional().omit_empty();
            schema.field("hits").omit_empty();
            schema.header::<Option<u32>>("retry_after", "Retry-After");
        }
    }

    fn run<T: Schema + Serialize>(value: &T) -> Projection {
        project(value, &descriptor_of::<T>().unwrap()).unwrap()
    }

    #[test]
    fn test_embed_flattens_with_status_and_headers() {
        let out = run(&NotFoundError {
            base: ErrorBase {
                code: "NOT_FOUND".into(),
                message: "missing".into(),
                trace_id: "t-1".into(),
            },
            resource: String::new(),
        });
        assert_eq!(out.status, Some(404));
        assert_eq!(out.headers["x-trace-id"], "t-1");
        assert_eq!(out.body, json!({"code": "NOT_FOUND", "message": "missing"}));
    }

    #[test]
    fn test_routing_fields_dropped() {
        let out = run(&UserResponse {
            id: "1".into(),
            page: 2,
            secret: "s".into(),
            etag: String::new(),
        });
        assert_eq!(out.body, json!({}));
        assert!(out.headers.is_empty());
        assert_eq!(out.status, None);
    }

    #[test]
    fn test_union_packed() {
        let out = run(&ShapeResponse {
            name: "c".into(),
            shape: Some(Shape::Circle { radius: 1.0 }),
        });
        assert_eq!(
            out.body,
            json!({"name": "c", "type": "circle", "properties": {"radius": 1.0}})
        );
        let out = run(&ShapeResponse {
            name: "none".into(),
            shape: None,
        });
        assert_eq!(out.body, json!({"name": "none"}));
    }

    #[test]
    fn test_unwrap_replaces_body() {
        let out = run(&ListResponse {
            items: Some(vec![1, 2]),
            total: 2,
        });
        assert_eq!(out.body, json!([1, 2]));
        let out = run(&ListResponse { items: None, total: 0 });
        assert_eq!(out.body, Value::Null);
    }

    #[test]
    fn test_optional_fields_keep_present_zero() {
        let out = run(&Counter {
            count: Some(0),
            label: Some(String::new()),
            hits: 0,
            retry_after: Some(0),
        });
        assert_eq!(out.body, json!({"count": 0, "label": ""}));
        assert_eq!(out.headers["retry-after"], "0");

        let out = run(&Counter {
            count: None,
            label: None,
            hits: 3,
            retry_after: None,
        });
        assert_eq!(out.body, json!({"hits": 3}));
        assert!(out.headers.is_empty());
    }

    #[test]
    fn test_zero_values() {
        assert!(is_zero(&json!(null)));
        assert!(is_zero(&json!(0.0)));
        assert!(is_zero(&json!({"a": 0, "b": {"c": ""}})));
        assert!(!is_zero(&json!({"a": 1})));
        assert!(!is_zero(&json!([0])));
        assert!(!is_zero(&json!(true)));
    }

    #[test]
    fn test_header_values_stringified() {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "X-Count", &json!(3)).unwrap();
        insert_header(&mut headers, "X-Flag", &json!(true)).unwrap();
        assert_eq!(headers["x-count"], "3");
        assert_eq!(headers["x-flag"], "true");
        let err = insert_header(&mut headers, "X-Bad", &json!("line\nbreak")).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidHeader { .. }));
    }

    #[test]
    fn test_non_object_passes_through() {
        let desc = descriptor_of::<ListResponse>().unwrap();
        let out = project_value(json!("plain"), &desc).unwrap();
        assert_eq!(out.body, json!("plain"));
    }
}
