//! # Thales Extract
//!
//! Request binding and response projection for the Thales pipeline.
//!
//! Both directions are driven by a type's [`TypeDescriptor`]:
//!
//! | Direction | Entry point | What it does |
//! |-----------|-------------|--------------|
//! | In | [`bind`] | merges path, query, header and body values into one struct |
//! | Out | [`project`] | pulls header fields out, drops routing fields, packs unions, unwraps envelopes |
//!
//! Scalars read from strings go through [`coerce`]; the union codec that
//! translates between tagged enums and discriminator/payload keys lives in
//! [`union`].
//!
//! ## Field sources
//!
//! | Source | Read from | Written to |
//! |--------|-----------|------------|
//! | body | JSON body | JSON body |
//! | path | path parameter | nothing |
//! | query | query string (first value) | nothing |
//! | header | request header | response header |
//! | skip | nothing | nothing |
//!
//! [`TypeDescriptor`]: thales_core::TypeDescriptor

#![doc(html_root_url = "https://docs.rs/thales-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bind;
mod coerce;
mod context;
mod error;
mod project;
pub mod union;

pub use bind::bind;
pub use coerce::coerce;
pub use context::ExtractionContext;
pub use error::{CoerceError, ExtractionSource, ProjectError};
pub use project::{is_zero, project, project_value, Projection};
