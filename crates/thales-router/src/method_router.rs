//! Per-path method table.

use http::Method;

use crate::error::RouteError;

/// Methods that get a slot, in the order `Allow` lists them.
const KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

/// Maps HTTP methods to route values for a single path.
///
/// ```rust
/// use thales_router::MethodRouter;
/// use http::Method;
///
/// let table = MethodRouter::new().get("list").post("create");
///
/// assert_eq!(table.handler(&Method::GET), Some(&"list"));
/// assert_eq!(table.handler(&Method::DELETE), None);
/// assert_eq!(table.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    slots: [Option<T>; 9],
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            slots: Default::default(),
        }
    }
}

fn slot_index(method: &Method) -> Option<usize> {
    KNOWN_METHODS.iter().position(|m| m == method)
}

impl<T> MethodRouter<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the GET value.
    #[must_use]
    pub fn get(self, value: T) -> Self {
        self.with(&Method::GET, value)
    }

    /// Sets the POST value.
    #[must_use]
    pub fn post(self, value: T) -> Self {
        self.with(&Method::POST, value)
    }

    /// Sets the PUT value.
    #[must_use]
    pub fn put(self, value: T) -> Self {
        self.with(&Method::PUT, value)
    }

    /// Sets the PATCH value.
    #[must_use]
    pub fn patch(self, value: T) -> Self {
        self.with(&Method::PATCH, value)
    }

    /// Sets the DELETE value.
    #[must_use]
    pub fn delete(self, value: T) -> Self {
        self.with(&Method::DELETE, value)
    }

    /// Sets the HEAD value.
    #[must_use]
    pub fn head(self, value: T) -> Self {
        self.with(&Method::HEAD, value)
    }

    /// Sets the OPTIONS value.
    #[must_use]
    pub fn options(self, value: T) -> Self {
        self.with(&Method::OPTIONS, value)
    }

    fn with(mut self, method: &Method, value: T) -> Self {
        if let Some(i) = slot_index(method) {
            self.slots[i] = Some(value);
        }
        self
    }

    /// Stores `value` under `method`, refusing to overwrite.
    ///
    /// On failure the value is handed back alongside the error.
    pub fn insert(&mut self, method: &Method, value: T) -> Result<(), (RouteError, T)> {
        let Some(i) = slot_index(method) else {
            return Err((RouteError::UnsupportedMethod(method.clone()), value));
        };
        if self.slots[i].is_some() {
            return Err((
                RouteError::Conflict {
                    method: method.clone(),
                    path: String::new(),
                },
                value,
            ));
        }
        self.slots[i] = Some(value);
        Ok(())
    }

    /// Returns the value registered for `method`.
    #[must_use]
    pub fn handler(&self, method: &Method) -> Option<&T> {
        slot_index(method).and_then(|i| self.slots[i].as_ref())
    }

    /// Methods with a registered value, in canonical order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        KNOWN_METHODS
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_some())
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// Value for the `Allow` response header, e.g. `"GET, POST"`.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.allowed_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns true when no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Moves every slot of `other` into `self`.
    ///
    /// Fails on the first method both tables define; `self` keeps whatever
    /// was merged before that point.
    pub fn merge(&mut self, other: MethodRouter<T>) -> Result<(), RouteError> {
        for (i, slot) in other.slots.into_iter().enumerate() {
            let Some(value) = slot else { continue };
            if self.slots[i].is_some() {
                return Err(RouteError::Conflict {
                    method: KNOWN_METHODS[i].clone(),
                    path: String::new(),
                });
            }
            self.slots[i] = Some(value);
        }
        Ok(())
    }

    /// Consumes the table into `(method, value)` pairs in canonical order.
    #[must_use]
    pub fn into_entries(self) -> Vec<(Method, T)> {
        KNOWN_METHODS
            .into_iter()
            .zip(self.slots)
            .filter_map(|(m, slot)| slot.map(|v| (m, v)))
            .collect()
    }
}
