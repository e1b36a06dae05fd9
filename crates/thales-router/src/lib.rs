//! Segment radix tree router for Thales.
//!
//! Maps an HTTP method and request path to a route value and the path
//! parameters captured on the way. The tree owns matching only; what a route
//! value means is up to the caller.
//!
//! # Patterns
//!
//! - `users`: static segment
//! - `{id}`: one segment captured as `id`
//! - `*rest`: the remainder of the path captured as `rest` (last segment only)
//!
//! Static segments win over parameters, and parameters win over wildcards.
//! When a branch dead-ends the walk backs up and tries the next candidate, so
//! `/users/me` still reaches `/users/{id}` if `/users/me` only has children.
//!
//! # Example
//!
//! ```rust
//! use thales_router::{Lookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&Method::GET, "/orgs/{org}/users/{id}", 1).unwrap();
//! router.insert(&Method::GET, "/files/*path", 2).unwrap();
//!
//! let m = router.match_route(&Method::GET, "/orgs/acme/users/7").unwrap();
//! assert_eq!(*m.value, 1);
//! assert_eq!(m.params.get("org"), Some("acme"));
//!
//! assert_eq!(router.lookup(&Method::GET, "/nope"), Lookup::NotFound);
//! ```

#![doc(html_root_url = "https://docs.rs/thales-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::{Lookup, RouteMatch, Router};
