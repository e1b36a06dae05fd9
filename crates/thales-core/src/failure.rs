//! Handler and middleware failures.
//!
//! A handler either succeeds, asks the next middleware to take over, or fails.
//! Failures come in two shapes: a typed error body that is itself a response
//! (it has a descriptor, constraints and a JSON form), or an opaque error that
//! only the error classifier can turn into a response.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BoxError;
use crate::schema::{descriptor_of, Schema, SchemaError, TypeDescriptor};
use crate::validate::{Validate, Violations};

/// An error type that is written as a structured response.
///
/// Implemented for every type that is [`Schema`] + [`Validate`] + `Serialize`
/// + `std::error::Error`.
pub trait ErrorBody: std::error::Error + Send + Sync + 'static {
    /// Field descriptor of the concrete type.
    fn descriptor(&self) -> Result<Arc<TypeDescriptor>, SchemaError>;

    /// Runs the type's constraints.
    fn check(&self) -> Result<(), Violations>;

    /// Serializes the value as JSON.
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// `TypeId` of the concrete type, for allowlist checks.
    fn body_type(&self) -> TypeId;

    /// Rust name of the concrete type.
    fn body_type_name(&self) -> &'static str;

    /// Converts into a plain boxed error, keeping the concrete type for downcasts.
    fn into_boxed_error(self: Box<Self>) -> BoxError;
}

impl<T> ErrorBody for T
where
    T: Schema + Validate + Serialize + std::error::Error + Send + Sync + 'static,
{
    fn descriptor(&self) -> Result<Arc<TypeDescriptor>, SchemaError> {
        descriptor_of::<T>()
    }

    fn check(&self) -> Result<(), Violations> {
        self.validate()
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn body_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn body_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn into_boxed_error(self: Box<Self>) -> BoxError {
        self
    }
}

/// Why a handler or middleware did not produce a response.
#[derive(Debug)]
pub enum Failure {
    /// Structured error with its own status, headers and body.
    Typed(Box<dyn ErrorBody>),
    /// Anything else.
    Opaque(BoxError),
}

impl Failure {
    /// Wraps an error that has no response form.
    pub fn opaque(err: impl Into<BoxError>) -> Self {
        Self::Opaque(err.into())
    }

    /// Returns true for typed errors.
    #[must_use]
    pub const fn is_typed(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    /// Converts into a plain boxed error.
    #[must_use]
    pub fn into_boxed_error(self) -> BoxError {
        match self {
            Self::Typed(body) => body.into_boxed_error(),
            Self::Opaque(err) => err,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(body) => fmt::Display::fmt(body, f),
            Self::Opaque(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl<E: ErrorBody> From<E> for Failure {
    fn from(err: E) -> Self {
        Self::Typed(Box::new(err))
    }
}

/// Outcome of a typed handler that did not succeed.
#[derive(Debug)]
pub enum HandlerError {
    /// Skip the response and let later middleware produce it.
    Delegate,
    /// The handler failed.
    Failed(Failure),
}

impl HandlerError {
    /// Fails with an error that has no response form.
    pub fn opaque(err: impl Into<BoxError>) -> Self {
        Self::Failed(Failure::opaque(err))
    }
}

impl From<Failure> for HandlerError {
    fn from(failure: Failure) -> Self {
        Self::Failed(failure)
    }
}

impl<E: ErrorBody> From<E> for HandlerError {
    fn from(err: E) -> Self {
        Self::Failed(Failure::Typed(Box::new(err)))
    }
}
