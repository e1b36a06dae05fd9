//! Constraint checks applied to requests, responses and error bodies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Types that can check their own constraints.
///
/// The default implementation accepts every value.
///
/// ```
/// use thales_core::{Validate, Violations};
///
/// struct Page {
///     number: u32,
/// }
///
/// impl Validate for Page {
///     fn validate(&self) -> Result<(), Violations> {
///         let mut v = Violations::new();
///         v.require(self.number <= 100, "number", "must be at most 100");
///         v.into_result()
///     }
/// }
///
/// assert!(Page { number: 3 }.validate().is_ok());
/// assert!(Page { number: 300 }.validate().is_err());
/// ```
pub trait Validate {
    /// Checks the value, reporting every broken constraint.
    fn validate(&self) -> Result<(), Violations> {
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), Violations> {
        let mut all = Violations::new();
        for (i, item) in self.iter().enumerate() {
            if let Err(inner) = item.validate() {
                all.merge_prefixed(&i.to_string(), inner);
            }
        }
        all.into_result()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), Violations> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}

/// Broken constraints, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations {
    /// Messages per field path.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Violations {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Records `message` for `field` unless `ok` holds.
    pub fn require(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Absorbs `other`, prefixing each field with `prefix.`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: Violations) {
        for (field, messages) in other.fields {
            self.fields
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        if first {
            f.write_str("no violations")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Positive(i64);

    impl Validate for Positive {
        fn validate(&self) -> Result<(), Violations> {
            let mut v = Violations::new();
            v.require(self.0 > 0, "value", "must be positive");
            v.into_result()
        }
    }

    #[test]
    fn test_empty_is_ok() {
        assert!(Violations::new().into_result().is_ok());
        assert_eq!(Violations::new().to_string(), "no violations");
    }

    #[test]
    fn test_add_groups_by_field() {
        let mut v = Violations::new();
        v.add("email", "is required");
        v.add("email", "must contain @");
        v.add("age", "must be positive");
        assert_eq!(v.len(), 2);
        assert_eq!(v.get("email").unwrap().len(), 2);
        assert_eq!(
            v.to_string(),
            "age: must be positive; email: is required; email: must contain @"
        );
    }

    #[test]
    fn test_vec_prefixes_index() {
        let items = vec![Positive(1), Positive(-1), Positive(0)];
        let err = items.validate().unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.get("1.value").is_some());
        assert!(err.get("2.value").is_some());
    }

    #[test]
    fn test_option_none_is_valid() {
        let none: Option<Positive> = None;
        assert!(none.validate().is_ok());
        assert!(Some(Positive(-5)).validate().is_err());
    }
}
