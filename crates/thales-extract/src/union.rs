//! Translation between tagged enums and the discriminator wire form.
//!
//! A union slot holds a Rust enum in serde's externally tagged form:
//! `{"circle": {"radius": 2}}`, or `"unit"` for a unit variant. On the wire
//! the tag lives under the discriminator key and the payload under the wire
//! key: `{"type": "circle", "properties": {"radius": 2}}`.

use serde_json::{Map, Value};
use thales_core::UnionDescriptor;

/// Rewrites a merged source map so every union slot holds the tagged form
/// selected by its discriminator.
///
/// An absent discriminator, or one naming no declared variant, leaves the
/// slot unset so the field keeps its default.
pub fn decode_unions(map: &mut Map<String, Value>, unions: &[&UnionDescriptor]) {
    for union in unions {
        let tag = match map.get(&union.discriminator) {
            Some(Value::String(tag)) if union.has_variant(tag) => tag.clone(),
            _ => {
                map.remove(&union.slot);
                continue;
            }
        };
        let payload = map.remove(&union.wire_key).unwrap_or(Value::Null);
        let mut tagged = Map::with_capacity(1);
        tagged.insert(tag, payload);
        map.insert(union.slot.clone(), Value::Object(tagged));
    }
}

/// Replaces every union slot in a serialized map with its discriminator and
/// payload. An empty slot (`null`) produces neither.
pub fn encode_unions(map: &mut Map<String, Value>, unions: &[&UnionDescriptor]) {
    for union in unions {
        let Some(slot) = map.remove(&union.slot) else {
            continue;
        };
        match slot {
            Value::Object(tagged) if tagged.len() == 1 => {
                if let Some((tag, payload)) = tagged.into_iter().next() {
                    map.insert(union.discriminator.clone(), Value::String(tag));
                    map.insert(union.wire_key.clone(), payload);
                }
            }
            Value::String(tag) => {
                map.insert(union.discriminator.clone(), Value::String(tag));
            }
            _ => {}
        }
    }
}
