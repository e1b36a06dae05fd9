//! Registration-order bookkeeping.
//!
//! Routes and middleware share one counter across a whole router tree. A
//! route's position in that sequence decides which ancestor middleware runs
//! before its handler and which runs after.

use std::fmt;

use crate::middleware::BoxedMiddleware;

/// A middleware tagged with the order it was registered at.
#[derive(Clone)]
pub struct Layer {
    /// Position in the tree-wide registration sequence.
    pub order: u64,
    /// The middleware itself.
    pub middleware: BoxedMiddleware,
}

impl Layer {
    /// Tags `middleware` with `order`.
    #[must_use]
    pub fn new(order: u64, middleware: BoxedMiddleware) -> Self {
        Self { order, middleware }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("order", &self.order)
            .field("middleware", &self.middleware.name())
            .finish()
    }
}

/// Collects layers from several nodes into one list sorted by order.
pub fn sorted<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Vec<Layer> {
    let mut out: Vec<Layer> = layers.into_iter().cloned().collect();
    out.sort_by_key(|l| l.order);
    out
}

/// Splits sorted layers around a route registered at `route_order`.
///
/// Layers registered before the route run before its handler; the rest run
/// after it.
///
/// ```
/// use thales_middleware::{from_sync_fn, order, Flow, Layer};
///
/// let mw = from_sync_fn("noop", |_| Flow::Continue);
/// let layers = vec![Layer::new(0, mw.clone()), Layer::new(1, mw.clone()), Layer::new(3, mw)];
/// let (before, after) = order::partition(layers, 2);
/// assert_eq!(before.len(), 2);
/// assert_eq!(after[0].order, 3);
/// ```
#[must_use]
pub fn partition(sorted: Vec<Layer>, route_order: u64) -> (Vec<Layer>, Vec<Layer>) {
    sorted.into_iter().partition(|l| l.order < route_order)
}
