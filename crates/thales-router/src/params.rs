//! Captured path parameters.

use smallvec::SmallVec;

/// Routes rarely capture more than this many segments.
const INLINE_CAPTURES: usize = 4;

/// Path parameters captured while walking the tree.
///
/// Pairs keep the order in which segments appeared in the path. Lookups are
/// linear, which beats hashing for the handful of captures a route has.
///
/// ```rust
/// use thales_router::Params;
///
/// let mut params = Params::new();
/// params.push("org", "acme");
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.names().collect::<Vec<_>>(), vec!["org", "id"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    captures: SmallVec<[(String, String); INLINE_CAPTURES]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured segment.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captures.push((name.into(), value.into()));
    }

    /// Returns the first value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Returns true when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Iterates over `(name, value)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.captures.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterates over parameter names in path order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.captures.iter().map(|(n, _)| n.as_str())
    }

    /// Drops captures past `len`. Used when a branch of the tree fails to match.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.captures.truncate(len);
    }
}

impl<N, V> FromIterator<(N, V)> for Params
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            captures: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}
