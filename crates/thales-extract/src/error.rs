//! Extraction error types.

use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use thales_core::{Error, ErrorKind, SchemaError};
use thiserror::Error;

/// Where a scalar value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path parameters (e.g., `/users/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// HTTP headers
    Header,
}

impl ExtractionSource {
    /// Parse error for a value of this source that did not convert.
    ///
    /// The message names the parameter, the cause is kept as the source.
    #[must_use]
    pub fn parse_error(self, name: &str, cause: CoerceError) -> Error {
        let message = match self {
            Self::Path => format!("invalid path parameter '{name}'"),
            Self::Query => format!("invalid query parameter '{name}'"),
            Self::Header => format!("invalid header '{name}'"),
        };
        Error::new(ErrorKind::Parse, message).with_source(cause)
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// A string that could not be converted to its scalar type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    /// Not an integer.
    #[error(transparent)]
    Int(#[from] ParseIntError),

    /// An integer outside the field's range.
    #[error("value {value} out of range for {bits}-bit integer")]
    OutOfRange {
        /// Parsed value.
        value: String,
        /// Width of the target type.
        bits: u32,
    },

    /// Not a number.
    #[error(transparent)]
    Float(#[from] ParseFloatError),

    /// NaN or infinite, which JSON cannot carry.
    #[error("value {0} is not a finite number")]
    NotFinite(String),

    /// Not one of the accepted boolean spellings.
    #[error("invalid boolean {0:?}")]
    Bool(String),
}

/// A value that could not be turned into a response.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Serde refused to serialize the value.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The type description is unusable.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A header field holds something that cannot be a header.
    #[error("invalid value for header '{name}'")]
    InvalidHeader {
        /// Header name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_messages() {
        let cause = CoerceError::Bool("maybe".into());
        let err = ExtractionSource::Query.parse_error("active", cause.clone());
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.message(), "invalid query parameter 'active'");
        assert_eq!(err.downcast_source::<CoerceError>(), Some(&cause));

        let err = ExtractionSource::Header.parse_error("X-Count", cause.clone());
        assert_eq!(err.message(), "invalid header 'X-Count'");
        let err = ExtractionSource::Path.parse_error("id", cause);
        assert_eq!(err.message(), "invalid path parameter 'id'");
    }
}
