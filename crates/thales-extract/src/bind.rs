//! Multi-source request binding.
//!
//! A request type is bound in four passes over one JSON object:
//!
//! 1. the body, when present, is parsed and every key belonging to a path,
//!    query, header or skipped field is dropped from it;
//! 2. each path, query and header field with a non-empty source value is
//!    coerced to its scalar kind and inserted under the field's key;
//! 3. union slots are filled from their discriminators;
//! 4. the result is laid over the serialized `T::default()`.
//!
//! The merged object is then deserialized into the target type. Fields with
//! no value anywhere keep the value `T::default()` gives them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thales_core::{Error, ErrorKind, FieldSource, TypeDescriptor};

use crate::coerce::coerce;
use crate::context::ExtractionContext;
use crate::error::ExtractionSource;
use crate::union::decode_unions;

/// Binds `T` from every source of the request, using `desc` for field
/// sources.
///
/// Fails with [`ErrorKind::Parse`] on the first value that does not convert
/// or when the body is not valid JSON for `T`.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use thales_core::{descriptor_of, Schema, SchemaBuilder};
/// use thales_extract::{bind, ExtractionContext};
/// use thales_router::Params;
/// use http::Request;
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct GetUser {
///     user_id: String,
///     page: i64,
/// }
///
/// impl Schema for GetUser {
///     fn describe(schema: &mut SchemaBuilder) {
///         schema.path::<String>("user_id", "id");
///         schema.query::<i64>("page", "page");
///     }
/// }
///
/// let (parts, ()) = Request::get("/users/123?page=2").body(()).unwrap().into_parts();
/// let params: Params = [("id", "123")].into_iter().collect();
/// let ctx = ExtractionContext::new(&parts, b"", &params);
///
/// let req: GetUser = bind(&ctx, &descriptor_of::<GetUser>().unwrap()).unwrap();
/// assert_eq!(req.user_id, "123");
/// assert_eq!(req.page, 2);
/// ```
pub fn bind<T>(ctx: &ExtractionContext<'_>, desc: &TypeDescriptor) -> Result<T, Error>
where
    T: DeserializeOwned + Serialize + Default,
{
    let fields = desc.flattened_fields();

    let mut sources = read_body(ctx, desc)?;
    for field in &fields {
        if !matches!(field.source, FieldSource::Body) {
            sources.remove(&field.key);
        }
    }

    for field in &fields {
        let (source, name, raw) = match &field.source {
            FieldSource::Path(name) => (ExtractionSource::Path, name, ctx.path_param(name)),
            FieldSource::Query(name) => (ExtractionSource::Query, name, ctx.query_param(name)),
            FieldSource::Header(name) => (ExtractionSource::Header, name, ctx.header(name)),
            FieldSource::Body | FieldSource::Skip => continue,
        };
        let (Some(raw), Some(kind)) = (raw.filter(|r| !r.is_empty()), field.scalar) else {
            continue;
        };
        let value = coerce(raw, kind).map_err(|cause| source.parse_error(name, cause))?;
        sources.insert(field.key.clone(), value);
    }

    decode_unions(&mut sources, &desc.flattened_unions());

    let mut merged = defaults::<T>()?;
    merged.extend(sources);
    serde_json::from_value(Value::Object(merged)).map_err(invalid_json)
}

fn defaults<T: Serialize + Default>() -> Result<Map<String, Value>, Error> {
    match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(err) => Err(Error::new(ErrorKind::Serialization, "failed to encode request defaults")
            .with_source(err)),
    }
}

fn read_body(ctx: &ExtractionContext<'_>, desc: &TypeDescriptor) -> Result<Map<String, Value>, Error> {
    if ctx.is_body_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_slice(ctx.body()).map_err(invalid_json)?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(_) if desc.unwrap_field().is_some() => {
            let mut map = Map::new();
            if let Some(field) = desc.unwrap_field() {
                map.insert(field.key.clone(), value);
            }
            Ok(map)
        }
        other => Err(Error::new(ErrorKind::Parse, "invalid JSON").with_source(format!(
            "expected a JSON object, found {}",
            json_type(&other)
        ))),
    }
}

fn invalid_json(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Parse, "invalid JSON").with_source(err)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
