//! Router front end over the segment tree.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;

/// A route value found for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// Value registered for the method and pattern.
    pub value: &'a T,
    /// Parameters captured from the path.
    pub params: Params,
}

/// Outcome of a lookup that distinguishes 404 from 405.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// Method and path matched.
    Found(RouteMatch<'a, T>),
    /// The path matched but not the method.
    MethodNotAllowed {
        /// Methods registered for the path.
        allowed: Vec<Method>,
    },
    /// Nothing matched the path.
    NotFound,
}

/// Maps `(method, path)` to values of type `T`.
///
/// Priority is static segment, then `{param}`, then `*wildcard`. Trailing
/// and doubled slashes are ignored.
///
/// ```rust
/// use thales_router::{Lookup, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(&Method::GET, "/users/{id}", "show").unwrap();
///
/// match router.lookup(&Method::GET, "/users/7") {
///     Lookup::Found(m) => {
///         assert_eq!(*m.value, "show");
///         assert_eq!(m.params.get("id"), Some("7"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// assert!(matches!(
///     router.lookup(&Method::DELETE, "/users/7"),
///     Lookup::MethodNotAllowed { .. }
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers `value` for `method` and `path`.
    ///
    /// Registering the same method and pattern twice is an error rather than
    /// a silent overwrite.
    pub fn insert(&mut self, method: &Method, path: &str, value: T) -> Result<(), RouteError> {
        self.root.insert(method, path, value)?;
        self.route_count += 1;
        Ok(())
    }

    /// Registers every method of `table` under `path`.
    pub fn insert_table(&mut self, path: &str, table: MethodRouter<T>) -> Result<(), RouteError> {
        for (method, value) in table.into_entries() {
            self.insert(&method, path, value)?;
        }
        Ok(())
    }

    /// Looks up a route, returning `None` for both 404 and 405.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        match self.lookup(method, path) {
            Lookup::Found(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a route and reports why it failed.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_, T> {
        let Some((table, params)) = self.root.match_path(path) else {
            return Lookup::NotFound;
        };
        match table.handler(method) {
            Some(value) => Lookup::Found(RouteMatch { value, params }),
            None => Lookup::MethodNotAllowed {
                allowed: table.allowed_methods(),
            },
        }
    }

    /// Returns the method table for a path regardless of method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Lists `(pattern, method, value)` for every route.
    #[must_use]
    pub fn routes(&self) -> Vec<(String, Method, &T)> {
        let mut out = Vec::new();
        self.root.walk("", &mut |pattern, table| {
            for method in table.allowed_methods() {
                if let Some(value) = table.handler(&method) {
                    out.push((pattern.to_string(), method, value));
                }
            }
        });
        out
    }

    /// Number of registered `(method, pattern)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
