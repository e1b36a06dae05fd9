//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every link of a chain
//! implements, and the [`Flow`] each link answers with.
//!
//! # Example
//!
//! ```
//! use thales_middleware::{BoxFuture, Exchange, Flow, Middleware};
//!
//! struct RequireTenant;
//!
//! impl Middleware for RequireTenant {
//!     fn name(&self) -> &'static str {
//!         "require-tenant"
//!     }
//!
//!     fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, Flow> {
//!         Box::pin(async move {
//!             if ex.headers().contains_key("x-tenant") {
//!                 Flow::Continue
//!             } else {
//!                 ex.response_mut().write_head(http::StatusCode::FORBIDDEN);
//!                 Flow::Halt
//!             }
//!         })
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thales_core::Failure;

use crate::exchange::Exchange;

/// A boxed future borrowing from the exchange.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// What a link asks the chain to do next.
#[derive(Debug)]
pub enum Flow {
    /// Run the next link.
    Continue,
    /// Run the next link, skipping the typed handler if it has not run yet.
    Delegate,
    /// Stop and classify the failure like a handler error.
    Fail(Failure),
    /// Stop; the response is complete.
    Halt,
}

impl Flow {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Delegate => "delegate",
            Self::Fail(_) => "fail",
            Self::Halt => "halt",
        }
    }
}

impl From<Failure> for Flow {
    fn from(failure: Failure) -> Self {
        Self::Fail(failure)
    }
}

/// A link of a middleware chain.
///
/// Middleware runs in registration order around the typed handler. It may
/// inspect and extend the exchange, write a response, or stop the chain.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        "middleware"
    }

    /// Runs this link.
    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, Flow>;
}

/// A middleware built from an async function.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a named function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").field("name", &self.name).finish()
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, Flow> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, Flow> {
        (self.func)(ex)
    }
}

/// Wraps an async function as a shareable middleware.
///
/// ```
/// use thales_middleware::{from_fn, Flow};
///
/// let timing = from_fn("timing", |ex| {
///     Box::pin(async move {
///         ex.response_mut().headers_mut().insert("x-served-by", "thales".parse().unwrap());
///         Flow::Continue
///     })
/// });
/// assert_eq!(timing.name(), "timing");
/// ```
pub fn from_fn<F>(name: &'static str, func: F) -> BoxedMiddleware
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, Flow> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware::new(name, func))
}

/// A middleware built from a synchronous function.
pub struct SyncFnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> Middleware for SyncFnMiddleware<F>
where
    F: Fn(&mut Exchange) -> Flow + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, Flow> {
        let flow = (self.func)(ex);
        Box::pin(std::future::ready(flow))
    }
}

/// Wraps a synchronous function as a shareable middleware.
pub fn from_sync_fn<F>(name: &'static str, func: F) -> BoxedMiddleware
where
    F: Fn(&mut Exchange) -> Flow + Send + Sync + 'static,
{
    Arc::new(SyncFnMiddleware { name, func })
}
