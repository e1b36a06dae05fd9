//! # Thales Core
//!
//! Types shared by every layer of the Thales request pipeline:
//!
//! - [`Error`] and [`ErrorKind`]: the classified failure every stage reports
//! - [`SetupError`]: registration-time failures
//! - [`Schema`] and [`TypeDescriptor`]: per-type field tables describing where
//!   each field is bound from and how it is written back
//! - [`Validate`] and [`Violations`]: the constraint hook applied to requests,
//!   responses and typed errors alike
//! - [`Failure`], [`HandlerError`] and [`ErrorBody`]: what handlers and
//!   middleware return when they do not succeed
//! - [`RequestContext`] and [`RequestId`]: per-request state for handlers

#![doc(html_root_url = "https://docs.rs/thales-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod failure;
pub mod schema;
mod types;
mod validate;

pub use context::{RequestContext, RequestId};
pub use error::{BoxError, Error, ErrorKind, SetupError};
pub use failure::{ErrorBody, Failure, HandlerError};
pub use schema::{
    descriptor_of, FieldDescriptor, FieldSource, ScalarKind, Schema, SchemaBuilder, SchemaError,
    TypeDescriptor, UnionDescriptor, UnionSpec,
};
pub use types::{Empty, NoContent};
pub use validate::{Validate, Violations};
