//! Ready-made request and response types.

use serde::{Deserialize, Serialize};

use crate::schema::{Schema, SchemaBuilder};
use crate::validate::Validate;

/// Request or response with no fields. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

impl Schema for Empty {}
impl Validate for Empty {}

/// Response that answers `204 No Content`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoContent {}

impl Schema for NoContent {
    fn describe(schema: &mut SchemaBuilder) {
        schema.status(204);
    }
}

impl Validate for NoContent {}
