//! Chain execution.
//!
//! A chain is the flat, precomputed sequence of links for one route: ancestor
//! middleware registered before the route, route-scoped middleware, the typed
//! handler, then ancestor middleware registered after the route.

use std::fmt;

use thales_core::Failure;
use tracing::debug;

use crate::exchange::Exchange;
use crate::middleware::{BoxedMiddleware, Flow};
use crate::order::Layer;

/// One step of a chain.
#[derive(Clone)]
pub enum Link {
    /// Middleware.
    Layer(BoxedMiddleware),
    /// The typed handler. Skipped once a link has delegated.
    Handler(BoxedMiddleware),
}

impl Link {
    fn middleware(&self) -> &BoxedMiddleware {
        match self {
            Self::Layer(m) | Self::Handler(m) => m,
        }
    }
}

/// Immutable sequence of links.
#[derive(Clone, Default)]
pub struct Chain {
    links: Vec<Link>,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Chain {
    /// Starts an empty chain.
    #[must_use]
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// Link names in execution order; the handler is listed as its name.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.links.iter().map(|l| l.middleware().name()).collect()
    }

    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true when the chain has no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Runs the chain against `ex`.
    ///
    /// Stops at the first `Halt` or `Fail`. `Delegate` continues but skips
    /// the handler if it has not run yet. Running off the end is not an
    /// error; an untouched response then becomes an empty `200 OK`.
    pub async fn run(&self, ex: &mut Exchange) -> Result<(), Failure> {
        let mut skip_handler = false;
        for link in &self.links {
            if skip_handler && matches!(link, Link::Handler(_)) {
                debug!("handler skipped after delegation");
                continue;
            }
            let middleware = link.middleware();
            let flow = middleware.call(ex).await;
            debug!(link = middleware.name(), flow = flow.as_str(), "link finished");
            match flow {
                Flow::Continue => {}
                Flow::Delegate => skip_handler = true,
                Flow::Fail(failure) => return Err(failure),
                Flow::Halt => return Ok(()),
            }
        }
        Ok(())
    }
}

/// Assembles a [`Chain`].
#[derive(Default)]
pub struct ChainBuilder {
    links: Vec<Link>,
}

impl ChainBuilder {
    /// Appends middleware layers.
    #[must_use]
    pub fn layers(mut self, layers: impl IntoIterator<Item = Layer>) -> Self {
        self.links
            .extend(layers.into_iter().map(|l| Link::Layer(l.middleware)));
        self
    }

    /// Appends plain middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.links.extend(middleware.into_iter().map(Link::Layer));
        self
    }

    /// Appends the handler link.
    #[must_use]
    pub fn handler(mut self, handler: BoxedMiddleware) -> Self {
        self.links.push(Link::Handler(handler));
        self
    }

    /// Finishes the chain.
    #[must_use]
    pub fn build(self) -> Chain {
        Chain { links: self.links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_sync_fn;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::{Arc, Mutex};

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn exchange() -> Exchange {
        let (parts, ()) = http::Request::get("/").body(()).unwrap().into_parts();
        Exchange::new(parts, Bytes::new())
    }

    fn recorder(trace: &Trace, name: &'static str, flow: fn() -> Flow) -> BoxedMiddleware {
        let trace = Arc::clone(trace);
        from_sync_fn(name, move |_| {
            trace.lock().unwrap().push(name);
            flow()
        })
    }

    fn writer(trace: &Trace, name: &'static str) -> BoxedMiddleware {
        let trace = Arc::clone(trace);
        from_sync_fn(name, move |ex| {
            trace.lock().unwrap().push(name);
            ex.response_mut().write(name.as_bytes());
            Flow::Halt
        })
    }

    #[tokio::test]
    async fn test_delegating_handler_hands_off() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .middleware([recorder(&trace, "mw1", || Flow::Continue), recorder(&trace, "mw2", || Flow::Continue)])
            .handler(recorder(&trace, "handler", || Flow::Continue))
            .middleware([writer(&trace, "mw3")])
            .build();

        let mut ex = exchange();
        chain.run(&mut ex).await.unwrap();
        assert_eq!(*trace.lock().unwrap(), vec!["mw1", "mw2", "handler", "mw3"]);
        assert_eq!(chain.names(), vec!["mw1", "mw2", "handler", "mw3"]);
    }

    #[tokio::test]
    async fn test_halting_handler_stops_chain() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .middleware([recorder(&trace, "mw1", || Flow::Continue)])
            .handler(writer(&trace, "handler"))
            .middleware([writer(&trace, "mw3")])
            .build();

        let mut ex = exchange();
        chain.run(&mut ex).await.unwrap();
        assert_eq!(*trace.lock().unwrap(), vec!["mw1", "handler"]);
    }

    #[tokio::test]
    async fn test_delegate_skips_handler() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .middleware([recorder(&trace, "auth", || Flow::Delegate)])
            .handler(writer(&trace, "handler"))
            .middleware([writer(&trace, "fallback")])
            .build();

        let mut ex = exchange();
        chain.run(&mut ex).await.unwrap();
        assert_eq!(*trace.lock().unwrap(), vec!["auth", "fallback"]);
    }

    #[tokio::test]
    async fn test_fail_short_circuits() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .middleware([recorder(&trace, "guard", || Flow::Fail(Failure::opaque("denied")))])
            .handler(writer(&trace, "handler"))
            .build();

        let mut ex = exchange();
        let failure = chain.run(&mut ex).await.unwrap_err();
        assert_eq!(failure.to_string(), "denied");
        assert_eq!(*trace.lock().unwrap(), vec!["guard"]);
        assert!(!ex.response().is_committed());
    }

    #[tokio::test]
    async fn test_exhausted_chain_leaves_empty_ok() {
        let trace = Trace::default();
        let chain = Chain::builder()
            .handler(recorder(&trace, "handler", || Flow::Continue))
            .build();
        let mut ex = exchange();
        chain.run(&mut ex).await.unwrap();
        assert_eq!(ex.into_response().status(), StatusCode::OK);
    }
}
