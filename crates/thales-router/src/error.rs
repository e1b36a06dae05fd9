//! Route registration errors.

use http::Method;
use thiserror::Error;

/// A route could not be added to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The same method is already registered for this path.
    #[error("route conflict: {method} {path} is already registered")]
    Conflict {
        /// Conflicting method.
        method: Method,
        /// Path pattern as given to `insert`.
        path: String,
    },

    /// Two patterns name the same parameter position differently.
    #[error("parameter conflict in {path}: '{{{found}}}' clashes with existing '{{{existing}}}'")]
    ParamConflict {
        /// Path pattern as given to `insert`.
        path: String,
        /// Name already stored in the tree.
        existing: String,
        /// Name the new pattern tried to use.
        found: String,
    },

    /// A `*name` segment appeared before the end of the pattern.
    #[error("wildcard must be the last segment in {path}")]
    WildcardNotLast {
        /// Path pattern as given to `insert`.
        path: String,
    },

    /// A `{}` or `*` segment without a name.
    #[error("unnamed parameter in {path}")]
    UnnamedParam {
        /// Path pattern as given to `insert`.
        path: String,
    },

    /// Extension methods have no slot in the method table.
    #[error("unsupported method {0}")]
    UnsupportedMethod(Method),
}
