//! # Thales
//!
//! Typed request pipeline and hierarchical middleware dispatch for HTTP
//! services.
//!
//! A handler is an async function from a request type to a response type.
//! Thales binds the request type from path parameters, the query string,
//! headers and the JSON body, validates it, calls the handler, then
//! validates and writes whatever the handler returned: the response, a
//! declared typed error, or a classified failure.
//!
//! Routers form a tree. Middleware registered on a node runs for every route
//! beneath it, on one side of the handler or the other depending on whether
//! it was registered before or after the route.
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use thales::prelude::*;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct GetUser {
//!     user_id: String,
//!     page: u32,
//! }
//!
//! impl Schema for GetUser {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema.path::<String>("user_id", "id");
//!         schema.query::<u32>("page", "page");
//!     }
//! }
//!
//! impl Validate for GetUser {}
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: String,
//! }
//!
//! impl Schema for User {}
//! impl Validate for User {}
//!
//! async fn get_user(_ctx: RequestContext, req: GetUser) -> Result<User, HandlerError> {
//!     Ok(User { id: req.user_id })
//! }
//!
//! # fn main() -> Result<(), SetupError> {
//! let root = Router::new();
//! let api = root.mount("/api", MountOptions::new())?;
//! api.get("/users/{id}", get_user)?;
//!
//! let service = root.freeze()?;
//! assert_eq!(service.catalog()[0].operation_id, "getApiUsersById");
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | errors, type descriptors, validation, failures, request context |
//! | [`extract`] | request binding and response projection |
//! | [`middleware`] | exchange, middleware trait, ordering, chains |
//! | [`router`] | the route trie |
//! | [`telemetry`] | logging setup |

#![doc(html_root_url = "https://docs.rs/thales/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod catalog;
mod classify;
mod config;
mod handler;
pub mod path;
mod service;
mod tree;

pub use catalog::{ParamRecord, RouteRecord};
pub use classify::write_default_error;
pub use config::{ConfigError, ErrorHandler, MountOptions, RouterConfig};
pub use handler::Handler;
pub use service::Service;
pub use tree::{RouteOptions, Router};

// Re-export the member crates
pub use thales_core as core;
pub use thales_extract as extract;
pub use thales_middleware as middleware;
pub use thales_router as router;
pub use thales_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use thales::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{MountOptions, RouteOptions, Router, RouterConfig, Service};

    pub use thales_core::{
        Empty, Error, ErrorKind, Failure, HandlerError, NoContent, RequestContext, RequestId,
        Schema, SchemaBuilder, SetupError, UnionSpec, Validate, Violations,
    };

    pub use thales_middleware::{from_fn, from_sync_fn, BoxedMiddleware, Exchange, Flow, Middleware};
}
