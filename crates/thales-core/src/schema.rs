//! Per-type field descriptors.
//!
//! A request, response or error type implements [`Schema`] to say where each
//! of its fields comes from and how it is written back out. The description
//! runs once per type; [`descriptor_of`] caches the resulting
//! [`TypeDescriptor`] by `TypeId` and hands out shared references afterwards.
//!
//! Keys are the serialized (serde) names of fields, not the Rust identifiers.
//! Fields that are never mentioned are plain JSON body fields.
//!
//! ```
//! use thales_core::schema::{descriptor_of, FieldSource, Schema, SchemaBuilder};
//!
//! struct GetUser;
//!
//! impl Schema for GetUser {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema.path::<String>("user_id", "id");
//!         schema.query::<Option<i64>>("page", "page").omit_empty();
//!     }
//! }
//!
//! let desc = descriptor_of::<GetUser>().unwrap();
//! assert_eq!(desc.field("user_id").unwrap().source, FieldSource::Path("id".into()));
//! assert!(desc.field("user_id").unwrap().required);
//! ```

use std::any::{type_name, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use thiserror::Error;

/// Scalar type a path, query or header value is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Taken verbatim.
    Str,
    /// Signed integer of the given bit width.
    Int(u32),
    /// Unsigned integer of the given bit width.
    Uint(u32),
    /// Floating point number.
    Float,
    /// `1 t T TRUE true True` or `0 f F FALSE false False`.
    Bool,
}

/// Rust types that can receive a path, query or header value.
pub trait Scalar {
    /// Conversion applied to the raw string.
    const KIND: ScalarKind;
    /// Whether the field may be absent.
    const OPTIONAL: bool = false;
}

macro_rules! scalar {
    ($kind:expr => $($ty:ty),+) => {
        $(impl Scalar for $ty {
            const KIND: ScalarKind = $kind;
        })+
    };
}

scalar!(ScalarKind::Str => String);
scalar!(ScalarKind::Bool => bool);
scalar!(ScalarKind::Float => f32, f64);
scalar!(ScalarKind::Int(8) => i8);
scalar!(ScalarKind::Int(16) => i16);
scalar!(ScalarKind::Int(32) => i32);
scalar!(ScalarKind::Int(64) => i64, isize);
scalar!(ScalarKind::Uint(8) => u8);
scalar!(ScalarKind::Uint(16) => u16);
scalar!(ScalarKind::Uint(32) => u32);
scalar!(ScalarKind::Uint(64) => u64, usize);

impl<T: Scalar> Scalar for Option<T> {
    const KIND: ScalarKind = T::KIND;
    const OPTIONAL: bool = true;
}

/// Where a field's value comes from, and whether it appears in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSource {
    /// JSON body field.
    Body,
    /// Path parameter with the given name.
    Path(String),
    /// Query parameter with the given name.
    Query(String),
    /// Header with the given name. On responses the value is written as a header.
    Header(String),
    /// Never read from or written to JSON.
    Skip,
}

impl FieldSource {
    /// Name of the parameter for path, query and header sources.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Path(n) | Self::Query(n) | Self::Header(n) => Some(n),
            Self::Body | Self::Skip => None,
        }
    }

    /// Location label: `path`, `query`, `header`, `body` or `skip`.
    #[must_use]
    pub const fn location(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Path(_) => "path",
            Self::Query(_) => "query",
            Self::Header(_) => "header",
            Self::Skip => "skip",
        }
    }
}

/// Metadata for one field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Serialized key.
    pub key: String,
    /// Value source.
    pub source: FieldSource,
    /// Conversion for path, query and header fields.
    pub scalar: Option<ScalarKind>,
    /// Dropped from JSON output when holding a zero value.
    pub omit_empty: bool,
    /// Holds an `Option`. Its zero value is `None`, so omit-empty drops
    /// only `null` and keeps `Some(0)`.
    pub optional: bool,
    /// Reported as required to schema consumers. Path parameters always are.
    pub required: bool,
    /// Descriptor of an embedded type whose fields are flattened into this one.
    pub embedded: Option<Arc<TypeDescriptor>>,
    /// The whole body collapses to this field's value.
    pub unwrap: bool,
}

impl FieldDescriptor {
    fn new(key: &str, source: FieldSource) -> Self {
        Self {
            key: key.to_string(),
            source,
            scalar: None,
            omit_empty: false,
            optional: false,
            required: false,
            embedded: None,
            unwrap: false,
        }
    }

    /// True for path, query and header fields.
    #[must_use]
    pub fn is_param(&self) -> bool {
        self.source.param_name().is_some()
    }
}

/// Declaration of a discriminated union slot.
///
/// The slot holds a Rust enum serialized in serde's externally tagged form
/// (`{"tag": payload}`). On the wire the tag lives under `discriminator` and
/// the payload under `wire_key`, both at the top level of the parent object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionSpec {
    discriminator: String,
    wire_key: String,
    variants: Vec<String>,
}

impl UnionSpec {
    /// Starts a union read from `discriminator` with its payload at `wire_key`.
    #[must_use]
    pub fn new(discriminator: impl Into<String>, wire_key: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.into(),
            wire_key: wire_key.into(),
            variants: Vec::new(),
        }
    }

    /// Declares a variant tag. Tags must match the enum's serde variant names.
    #[must_use]
    pub fn variant(mut self, tag: impl Into<String>) -> Self {
        self.variants.push(tag.into());
        self
    }
}

/// A validated union slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDescriptor {
    /// Serialized key of the enum-typed field.
    pub slot: String,
    /// Key holding the active variant tag.
    pub discriminator: String,
    /// Key holding the active variant payload.
    pub wire_key: String,
    /// Declared variant tags.
    pub variants: Vec<String>,
}

impl UnionDescriptor {
    /// Returns true when `tag` is a declared variant.
    #[must_use]
    pub fn has_variant(&self, tag: &str) -> bool {
        self.variants.iter().any(|v| v == tag)
    }
}

/// Everything the binder and projector need to know about a type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Rust type name, for messages and catalogs.
    pub type_name: &'static str,
    /// Status declared by the type itself.
    pub status: Option<u16>,
    /// Annotated fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Union slots in declaration order.
    pub unions: Vec<UnionDescriptor>,
}

impl TypeDescriptor {
    /// Looks up a field by serialized key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Every field as it appears on the wire: own fields plus the fields of
    /// embedded types, recursively. Embed carriers themselves are left out.
    #[must_use]
    pub fn flattened_fields(&self) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        for field in &self.fields {
            match &field.embedded {
                Some(inner) => out.extend(inner.flattened_fields()),
                None => out.push(field),
            }
        }
        out
    }

    /// Own unions plus those of embedded types.
    #[must_use]
    pub fn flattened_unions(&self) -> Vec<&UnionDescriptor> {
        let mut out: Vec<&UnionDescriptor> = self.unions.iter().collect();
        for inner in self.fields.iter().filter_map(|f| f.embedded.as_deref()) {
            out.extend(inner.flattened_unions());
        }
        out
    }

    /// Path, query and header fields, including embedded ones.
    #[must_use]
    pub fn params(&self) -> Vec<&FieldDescriptor> {
        self.flattened_fields()
            .into_iter()
            .filter(|f| f.is_param())
            .collect()
    }

    /// The unwrap field, if any.
    #[must_use]
    pub fn unwrap_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.unwrap)
    }

    /// Status declared by the type or, failing that, by an embedded type.
    #[must_use]
    pub fn effective_status(&self) -> Option<u16> {
        self.status.or_else(|| {
            self.fields
                .iter()
                .filter_map(|f| f.embedded.as_ref())
                .find_map(|e| e.effective_status())
        })
    }

    /// Header names written from this type, including embedded ones,
    /// paired with their serialized keys.
    #[must_use]
    pub fn response_headers(&self) -> Vec<(&str, &str)> {
        self.flattened_fields()
            .into_iter()
            .filter_map(|f| match &f.source {
                FieldSource::Header(name) => Some((f.key.as_str(), name.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// A type description that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A key was described twice.
    #[error("{type_name}: field '{key}' is described more than once")]
    DuplicateField {
        /// Offending type.
        type_name: &'static str,
        /// Repeated key.
        key: String,
    },

    /// More than one field asks to replace the body.
    #[error("{type_name}: only one unwrap field is allowed, found {count}")]
    MultipleUnwrap {
        /// Offending type.
        type_name: &'static str,
        /// Number of unwrap fields.
        count: usize,
    },

    /// A status was declared twice or is outside 100..=599.
    #[error("{type_name}: invalid status declaration: {reason}")]
    InvalidStatus {
        /// Offending type.
        type_name: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// A union declaration is incomplete or ambiguous.
    #[error("{type_name}: invalid union '{slot}': {reason}")]
    InvalidUnion {
        /// Offending type.
        type_name: &'static str,
        /// Slot key.
        slot: String,
        /// What is wrong.
        reason: String,
    },

    /// An embedded type failed to describe itself.
    #[error("{type_name}: embedded field '{key}' is invalid: {source}")]
    InvalidEmbed {
        /// Offending type.
        type_name: &'static str,
        /// Embed key.
        key: String,
        /// Failure of the embedded type.
        source: Box<SchemaError>,
    },
}

/// Handle returned by [`SchemaBuilder`] methods for per-field flags.
pub struct FieldRef<'a> {
    field: &'a mut FieldDescriptor,
}

impl FieldRef<'_> {
    /// Drop the field from JSON output when it holds a zero value.
    pub fn omit_empty(self) -> Self {
        self.field.omit_empty = true;
        self
    }

    /// Mark a body field as holding an `Option`. Path, query and header
    /// fields get this from their [`Scalar`] type.
    pub fn optional(self) -> Self {
        self.field.optional = true;
        self
    }

    /// Report the field as required to schema consumers.
    pub fn required(self) -> Self {
        self.field.required = true;
        self
    }
}

/// Collects field metadata for one type.
pub struct SchemaBuilder {
    type_name: &'static str,
    status: Option<u16>,
    fields: Vec<FieldDescriptor>,
    unions: Vec<UnionDescriptor>,
    errors: Vec<SchemaError>,
}

impl SchemaBuilder {
    /// Creates an empty builder for the named type.
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            status: None,
            fields: Vec::new(),
            unions: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, field: FieldDescriptor) -> FieldRef<'_> {
        let idx = self.fields.len();
        self.fields.push(field);
        FieldRef {
            field: &mut self.fields[idx],
        }
    }

    fn param<T: Scalar>(&mut self, key: &str, source: FieldSource) -> FieldRef<'_> {
        let mut field = FieldDescriptor::new(key, source);
        field.scalar = Some(T::KIND);
        field.optional = T::OPTIONAL;
        self.push(field)
    }

    /// Field bound from the path parameter `name`.
    pub fn path<T: Scalar>(&mut self, key: &str, name: &str) -> FieldRef<'_> {
        self.param::<T>(key, FieldSource::Path(name.to_string()))
            .required()
    }

    /// Field bound from the query parameter `name`.
    pub fn query<T: Scalar>(&mut self, key: &str, name: &str) -> FieldRef<'_> {
        self.param::<T>(key, FieldSource::Query(name.to_string()))
    }

    /// Field bound from, and written to, the header `name`.
    pub fn header<T: Scalar>(&mut self, key: &str, name: &str) -> FieldRef<'_> {
        self.param::<T>(key, FieldSource::Header(name.to_string()))
    }

    /// Plain body field, described only to attach flags.
    pub fn field(&mut self, key: &str) -> FieldRef<'_> {
        self.push(FieldDescriptor::new(key, FieldSource::Body))
    }

    /// Field that never appears in JSON.
    pub fn skip(&mut self, key: &str) -> FieldRef<'_> {
        self.push(FieldDescriptor::new(key, FieldSource::Skip))
    }

    /// Field holding a `T` whose fields are flattened into this type.
    ///
    /// The Rust field must carry `#[serde(flatten)]` so the JSON shape
    /// matches the flattened description.
    pub fn embed<T: Schema>(&mut self, key: &str) -> FieldRef<'_> {
        let mut field = FieldDescriptor::new(key, FieldSource::Body);
        match descriptor_of::<T>() {
            Ok(desc) => field.embedded = Some(desc),
            Err(source) => self.errors.push(SchemaError::InvalidEmbed {
                type_name: self.type_name,
                key: key.to_string(),
                source: Box::new(source),
            }),
        }
        self.push(field)
    }

    /// Sequence field that replaces the whole body.
    pub fn unwrap(&mut self, key: &str) -> FieldRef<'_> {
        let mut field = FieldDescriptor::new(key, FieldSource::Body);
        field.unwrap = true;
        self.push(field)
    }

    /// Enum-typed field exchanged through a discriminator and a payload key.
    pub fn union(&mut self, key: &str, spec: UnionSpec) {
        self.unions.push(UnionDescriptor {
            slot: key.to_string(),
            discriminator: spec.discriminator,
            wire_key: spec.wire_key,
            variants: spec.variants,
        });
    }

    /// Status written when this type is the response or error body.
    pub fn status(&mut self, code: u16) {
        if let Some(previous) = self.status {
            self.errors.push(SchemaError::InvalidStatus {
                type_name: self.type_name,
                reason: format!("declared as {previous} and {code}"),
            });
        } else if !(100..=599).contains(&code) {
            self.errors.push(SchemaError::InvalidStatus {
                type_name: self.type_name,
                reason: format!("{code} is not an HTTP status"),
            });
        }
        self.status = Some(code);
    }

    /// Checks the collected metadata and produces the descriptor.
    pub fn finish(mut self) -> Result<TypeDescriptor, SchemaError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let mut keys = HashSet::new();
        for field in &self.fields {
            let wire_keys: Vec<&str> = match &field.embedded {
                Some(inner) => inner.flattened_fields().into_iter().map(|f| f.key.as_str()).collect(),
                None => vec![field.key.as_str()],
            };
            for key in wire_keys {
                if !keys.insert(key) {
                    return Err(SchemaError::DuplicateField {
                        type_name: self.type_name,
                        key: key.to_string(),
                    });
                }
            }
        }

        let unwraps = self.fields.iter().filter(|f| f.unwrap).count();
        if unwraps > 1 {
            return Err(SchemaError::MultipleUnwrap {
                type_name: self.type_name,
                count: unwraps,
            });
        }

        self.check_unions()?;

        Ok(TypeDescriptor {
            type_name: self.type_name,
            status: self.status,
            fields: self.fields,
            unions: self.unions,
        })
    }

    fn check_unions(&self) -> Result<(), SchemaError> {
        let invalid = |slot: &str, reason: String| SchemaError::InvalidUnion {
            type_name: self.type_name,
            slot: slot.to_string(),
            reason,
        };

        let mut claimed: HashMap<&str, &str> = HashMap::new();
        let mut tags_by_discriminator: HashMap<&str, HashSet<&str>> = HashMap::new();

        for union in &self.unions {
            if union.discriminator.is_empty() || union.wire_key.is_empty() {
                return Err(invalid(&union.slot, "discriminator and payload key are required".into()));
            }
            if union.variants.is_empty() {
                return Err(invalid(&union.slot, "no variants declared".into()));
            }
            if union.discriminator == union.wire_key {
                return Err(invalid(
                    &union.slot,
                    format!("discriminator and payload share the key '{}'", union.wire_key),
                ));
            }
            if self
                .fields
                .iter()
                .any(|f| f.key == union.slot && f.source != FieldSource::Body)
            {
                return Err(invalid(&union.slot, "slot is also a parameter or skipped field".into()));
            }

            for key in [union.slot.as_str(), union.wire_key.as_str()] {
                if let Some(owner) = claimed.insert(key, &union.slot) {
                    if key != union.slot || owner != union.slot {
                        return Err(invalid(
                            &union.slot,
                            format!("key '{key}' is already used by union '{owner}'"),
                        ));
                    }
                }
            }

            let seen = tags_by_discriminator
                .entry(union.discriminator.as_str())
                .or_default();
            for tag in &union.variants {
                if !seen.insert(tag.as_str()) {
                    return Err(invalid(
                        &union.slot,
                        format!(
                            "variant '{tag}' of discriminator '{}' is declared more than once",
                            union.discriminator
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Describes the fields of a request, response or error type.
///
/// The default description is empty: every field is a JSON body field.
pub trait Schema: 'static {
    /// Records field metadata on `schema`.
    fn describe(schema: &mut SchemaBuilder) {
        let _ = schema;
    }
}

type Cache = RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached descriptor of `T`, describing it on first use.
///
/// Failed descriptions are not cached; they surface again on every call.
pub fn descriptor_of<T: Schema>() -> Result<Arc<TypeDescriptor>, SchemaError> {
    let id = TypeId::of::<T>();
    if let Some(desc) = cache().read().get(&id) {
        return Ok(Arc::clone(desc));
    }

    let mut builder = SchemaBuilder::new(type_name::<T>());
    T::describe(&mut builder);
    let desc = Arc::new(builder.finish()?);
    tracing::debug!(
        type_name = desc.type_name,
        fields = desc.fields.len(),
        unions = desc.unions.len(),
        "described type"
    );

    let mut guard = cache().write();
    Ok(Arc::clone(guard.entry(id).or_insert(desc)))
}
