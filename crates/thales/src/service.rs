//! Frozen dispatch.
//!
//! A [`Service`] holds one precomputed chain per route and answers requests
//! without further locking. Requests that match no route, or match a path
//! but not its method, run the middleware of every node whose base path
//! covers them before the not-found or method-not-allowed response.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use thales_core::{Error, SetupError};
use thales_middleware::{
    order, BoxFuture, BoxedMiddleware, Chain, Exchange, Flow, Layer, Middleware, Request,
    Response,
};
use thales_router::{Lookup, Router as Trie};
use thales_telemetry::fields;
use tracing::field::Empty;
use tracing::{debug, info_span, Instrument, Span};

use crate::catalog::RouteRecord;
use crate::classify::ErrorPolicy;
use crate::path::matches_path;
use crate::tree::Blueprint;

struct RouteEntry {
    route: String,
    chain: Chain,
    policy: Arc<ErrorPolicy>,
}

struct Scope {
    base_path: String,
    layers: Vec<Layer>,
}

struct Inner {
    trie: Trie<RouteEntry>,
    scopes: Vec<Scope>,
    root_policy: Arc<ErrorPolicy>,
    catalog: Vec<RouteRecord>,
}

/// An immutable, shareable request dispatcher.
///
/// ```ignore
/// let service = router.freeze()?;
/// let response = service.call(request).await;
/// ```
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("routes", &self.inner.catalog.len())
            .field("scopes", &self.inner.scopes.len())
            .finish()
    }
}

impl Service {
    pub(crate) fn build(blueprint: &Blueprint) -> Result<Self, SetupError> {
        let mut trie = Trie::new();
        for route in &blueprint.routes {
            let layers = order::sorted(
                blueprint
                    .ancestors(route.node)
                    .into_iter()
                    .flat_map(|i| blueprint.nodes[i].layers.iter()),
            );
            let (before, after) = order::partition(layers, route.order);
            let chain = Chain::builder()
                .layers(before)
                .middleware(route.middleware.iter().cloned())
                .handler(Arc::clone(&route.link))
                .layers(after)
                .build();
            debug!(
                method = %route.record.method,
                path = %route.record.path,
                chain = ?chain.names(),
                "chain built"
            );
            trie.insert(
                &route.record.method,
                &route.record.path,
                RouteEntry {
                    route: route.record.path.clone(),
                    chain,
                    policy: Arc::clone(&route.policy),
                },
            )?;
        }

        let root_policy = blueprint.nodes.first().map_or_else(
            || ErrorPolicy::new(&crate::RouterConfig::default(), Vec::new()),
            |root| ErrorPolicy::new(&root.config, Vec::new()),
        );
        let scopes = blueprint
            .nodes
            .iter()
            .map(|node| Scope {
                base_path: node.base_path.clone(),
                layers: node.layers.clone(),
            })
            .collect();

        Ok(Self {
            inner: Arc::new(Inner {
                trie,
                scopes,
                root_policy: Arc::new(root_policy),
                catalog: blueprint.routes.iter().map(|r| r.record.clone()).collect(),
            }),
        })
    }

    /// Serves one request.
    pub async fn call(&self, request: Request) -> Response {
        self.dispatch(Exchange::read(request).await).await
    }

    /// Serves an already buffered request.
    pub async fn dispatch(&self, mut ex: Exchange) -> Response {
        let span = info_span!(
            "request",
            { fields::REQUEST_ID } = %ex.request_id(),
            { fields::HTTP_METHOD } = %ex.method(),
            { fields::HTTP_PATH } = %ex.path(),
            { fields::ROUTE } = Empty,
            { fields::HTTP_STATUS } = Empty,
            { fields::ERROR_KIND } = Empty,
            { fields::DURATION_MS } = Empty,
        );
        async move {
            self.route(&mut ex).await;
            let status = ex.response().status().unwrap_or(StatusCode::OK).as_u16();
            let duration_ms = u64::try_from(ex.elapsed().as_millis()).unwrap_or(u64::MAX);
            let span = Span::current();
            span.record(fields::HTTP_STATUS, status);
            span.record(fields::DURATION_MS, duration_ms);
            thales_telemetry::log_request_complete!(ex.request_id(), status, duration_ms);
            ex.into_response()
        }
        .instrument(span)
        .await
    }

    async fn route(&self, ex: &mut Exchange) {
        let method = ex.method().clone();
        let path = ex.path().to_string();
        let lookup = match self.inner.trie.lookup(&method, &path) {
            Lookup::MethodNotAllowed { .. } if method == Method::HEAD => {
                self.inner.trie.lookup(&Method::GET, &path)
            }
            other => other,
        };

        match lookup {
            Lookup::Found(found) => {
                ex.set_params(found.params);
                let entry = found.value;
                Span::current().record(fields::ROUTE, entry.route.as_str());
                debug!(chain = ?entry.chain.names(), "route matched");
                if let Err(failure) = entry.chain.run(ex).await {
                    entry.policy.middleware_failure(ex, failure);
                }
            }
            Lookup::MethodNotAllowed { allowed } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.fallback(ex, &path, Some(allow)).await;
            }
            Lookup::NotFound => self.fallback(ex, &path, None).await,
        }
    }

    async fn fallback(&self, ex: &mut Exchange, path: &str, allow: Option<String>) {
        let layers = order::sorted(
            self.inner
                .scopes
                .iter()
                .filter(|scope| matches_path(&scope.base_path, path))
                .flat_map(|scope| scope.layers.iter()),
        );
        let terminal: BoxedMiddleware = Arc::new(Unrouted {
            allow,
            policy: Arc::clone(&self.inner.root_policy),
        });
        let chain = Chain::builder().layers(layers).middleware([terminal]).build();
        debug!(chain = ?chain.names(), "no route matched");
        if let Err(failure) = chain.run(ex).await {
            self.inner.root_policy.middleware_failure(ex, failure);
        }
    }

    /// Registration records for every route, in registration order.
    #[must_use]
    pub fn catalog(&self) -> &[RouteRecord] {
        &self.inner.catalog
    }
}

/// Last step of a fallback chain: answers 404, or 405 with `Allow`.
struct Unrouted {
    allow: Option<String>,
    policy: Arc<ErrorPolicy>,
}

impl Middleware for Unrouted {
    fn name(&self) -> &'static str {
        "unrouted"
    }

    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, Flow> {
        let err = match &self.allow {
            Some(allow) => {
                if let Ok(value) = HeaderValue::from_str(allow) {
                    ex.response_mut().headers_mut().insert(ALLOW, value);
                }
                Error::method_not_allowed(ex.method(), ex.path())
            }
            None => Error::not_found(ex.method(), ex.path()),
        };
        self.policy.fail(ex, err);
        Box::pin(std::future::ready(Flow::Halt))
    }
}
