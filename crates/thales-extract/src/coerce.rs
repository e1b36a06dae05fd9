//! String to scalar conversion for path, query and header values.

use serde_json::{Number, Value};
use thales_core::ScalarKind;

use crate::error::CoerceError;

/// Converts `raw` to the JSON value a field of `kind` deserializes from.
///
/// Integers are range checked against the field's bit width. Booleans accept
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
///
/// ```rust
/// use thales_core::ScalarKind;
/// use thales_extract::coerce;
///
/// assert_eq!(coerce("42", ScalarKind::Int(64)).unwrap(), 42);
/// assert_eq!(coerce("T", ScalarKind::Bool).unwrap(), true);
/// assert!(coerce("300", ScalarKind::Uint(8)).is_err());
/// ```
pub fn coerce(raw: &str, kind: ScalarKind) -> Result<Value, CoerceError> {
    match kind {
        ScalarKind::Str => Ok(Value::String(raw.to_string())),
        ScalarKind::Int(bits) => {
            let value: i64 = raw.parse()?;
            if bits < 64 {
                let max = (1i64 << (bits - 1)) - 1;
                let min = -(1i64 << (bits - 1));
                if value < min || value > max {
                    return Err(CoerceError::OutOfRange {
                        value: raw.to_string(),
                        bits,
                    });
                }
            }
            Ok(Value::from(value))
        }
        ScalarKind::Uint(bits) => {
            let value: u64 = raw.parse()?;
            if bits < 64 && value >= (1u64 << bits) {
                return Err(CoerceError::OutOfRange {
                    value: raw.to_string(),
                    bits,
                });
            }
            Ok(Value::from(value))
        }
        ScalarKind::Float => {
            let value: f64 = raw.parse()?;
            Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| CoerceError::NotFinite(raw.to_string()))
        }
        ScalarKind::Bool => parse_bool(raw).map(Value::Bool),
    }
}

fn parse_bool(raw: &str) -> Result<bool, CoerceError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(CoerceError::Bool(other.to_string())),
    }
}
