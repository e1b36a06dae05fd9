//! Router tree and route registration.
//!
//! Every [`Router`] handle points at one node of a shared blueprint. The
//! blueprint owns the node arena, the routes, and the single registration
//! counter that orders routes and middleware across the whole tree.
//! [`Router::freeze`] compiles the blueprint into an immutable
//! [`Service`].

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use http::Method;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thales_core::{
    descriptor_of, ErrorBody, Schema, SchemaError, SetupError, TypeDescriptor, Validate,
};
use thales_middleware::{BoxedMiddleware, Layer};
use thales_router::Router as Trie;
use tracing::debug;

use crate::catalog::RouteRecord;
use crate::classify::ErrorPolicy;
use crate::config::{MountOptions, RouterConfig};
use crate::handler::{Handler, TypedLink};
use crate::path::{self, join_base, route_path};
use crate::service::Service;

pub(crate) struct Node {
    pub(crate) base_path: String,
    pub(crate) config: RouterConfig,
    pub(crate) parent: Option<usize>,
    pub(crate) layers: Vec<Layer>,
}

pub(crate) struct RouteSpec {
    pub(crate) node: usize,
    pub(crate) order: u64,
    pub(crate) link: BoxedMiddleware,
    pub(crate) middleware: Vec<BoxedMiddleware>,
    pub(crate) policy: Arc<ErrorPolicy>,
    pub(crate) record: RouteRecord,
}

pub(crate) struct Blueprint {
    next_order: u64,
    pub(crate) nodes: Vec<Node>,
    pub(crate) routes: Vec<RouteSpec>,
    trie: Trie<usize>,
}

impl Blueprint {
    fn take_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Node indices from the root down to `node`.
    pub(crate) fn ancestors(&self, node: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(index) = current {
            chain.push(index);
            current = self.nodes.get(index).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }
}

#[derive(Clone)]
struct DeclaredError {
    type_id: TypeId,
    describe: fn() -> Result<Arc<TypeDescriptor>, SchemaError>,
}

/// Per-route settings.
///
/// ```ignore
/// router.handle(
///     Method::GET,
///     "/users/{id}",
///     get_user,
///     RouteOptions::new().middleware(audit).error::<UserNotFound>(),
/// )?;
/// ```
#[derive(Clone, Default)]
#[must_use]
pub struct RouteOptions {
    middleware: Vec<BoxedMiddleware>,
    errors: Vec<DeclaredError>,
}

impl RouteOptions {
    /// No route middleware, no declared errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds middleware that runs right before this route's handler.
    pub fn middleware(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Declares a typed error the handler may return.
    pub fn error<E: ErrorBody + Schema>(mut self) -> Self {
        self.errors.push(DeclaredError {
            type_id: TypeId::of::<E>(),
            describe: descriptor_of::<E>,
        });
        self
    }
}

impl fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteOptions")
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("errors", &self.errors.len())
            .finish()
    }
}

/// Handle to one node of a router tree.
///
/// Handles are cheap to clone and safe to use from several threads; all of
/// them write to the same blueprint.
///
/// # Example
///
/// ```ignore
/// let root = Router::new();
/// root.layer(request_log);
///
/// let api = root.mount("/api", MountOptions::new())?;
/// api.get("/users/{id}", get_user)?;
///
/// let service = root.freeze()?;
/// ```
#[derive(Clone)]
pub struct Router {
    blueprint: Arc<Mutex<Blueprint>>,
    node: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("node", &self.node)
            .field("base_path", &self.base_path())
            .finish()
    }
}

impl Router {
    /// Creates a root router with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a root router.
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        let root = Node {
            base_path: join_base(&[&config.base_path]),
            config,
            parent: None,
            layers: Vec::new(),
        };
        let blueprint = Blueprint {
            next_order: 0,
            nodes: vec![root],
            routes: Vec::new(),
            trie: Trie::new(),
        };
        Self {
            blueprint: Arc::new(Mutex::new(blueprint)),
            node: 0,
        }
    }

    /// Creates a child node under `prefix`.
    ///
    /// The child's base path is this node's base path, then `prefix`, then
    /// the override base path, if any. Unset options inherit this node's
    /// configuration as it is now.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidPath`] when a prefix contains parameters,
    /// whitespace, `?` or `#`.
    pub fn mount(&self, prefix: &str, options: MountOptions) -> Result<Self, SetupError> {
        path::check_prefix(prefix)?;
        let extra = options.base_path.as_deref().unwrap_or_default();
        path::check_prefix(extra)?;

        let mut blueprint = self.blueprint.lock();
        let parent = &blueprint.nodes[self.node];
        let node = Node {
            base_path: join_base(&[&parent.base_path, prefix, extra]),
            config: parent.config.inherit(&options),
            parent: Some(self.node),
            layers: Vec::new(),
        };
        debug!(base_path = %node.base_path, "router mounted");
        blueprint.nodes.push(node);
        Ok(Self {
            blueprint: Arc::clone(&self.blueprint),
            node: blueprint.nodes.len() - 1,
        })
    }

    /// Registers middleware on this node.
    ///
    /// It runs for every route of this node and its descendants: before the
    /// handler for routes registered earlier than it, after the handler for
    /// routes registered later. It also runs on not-found and
    /// method-not-allowed requests under this node's base path.
    pub fn layer(&self, middleware: BoxedMiddleware) -> &Self {
        let mut blueprint = self.blueprint.lock();
        let order = blueprint.take_order();
        debug!(middleware = middleware.name(), order, "middleware registered");
        blueprint.nodes[self.node]
            .layers
            .push(Layer::new(order, middleware));
        self
    }

    /// Normalized base path of this node; empty for an unprefixed root.
    #[must_use]
    pub fn base_path(&self) -> String {
        self.blueprint.lock().nodes[self.node].base_path.clone()
    }

    /// True when `path` falls under this node's base path.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        path::matches_path(&self.blueprint.lock().nodes[self.node].base_path, path)
    }

    /// Registers a typed handler.
    ///
    /// `path` is joined with this node's base path. Parameters are written
    /// `{name}`; a final `*name` segment captures the rest of the path.
    ///
    /// # Errors
    ///
    /// Fails when a type description is invalid, the path is malformed, or
    /// the method and path are already taken.
    pub fn handle<Req, Resp, H>(
        &self,
        method: Method,
        path: &str,
        handler: H,
        options: RouteOptions,
    ) -> Result<(), SetupError>
    where
        Req: Schema + DeserializeOwned + Serialize + Default + Validate + Send + 'static,
        Resp: Schema + Serialize + Validate + Send + 'static,
        H: Handler<Req, Resp>,
    {
        path::check_route(path)?;
        let request = descriptor_of::<Req>()?;
        let response = descriptor_of::<Resp>()?;
        let errors = options
            .errors
            .iter()
            .map(|e| (e.describe)())
            .collect::<Result<Vec<_>, _>>()?;
        let declared = options.errors.iter().map(|e| e.type_id).collect();

        let mut blueprint = self.blueprint.lock();
        let node = &blueprint.nodes[self.node];
        let full_path = route_path(&node.base_path, path);
        let policy = Arc::new(ErrorPolicy::new(&node.config, declared));

        let index = blueprint.routes.len();
        blueprint.trie.insert(&method, &full_path, index)?;
        let order = blueprint.take_order();
        debug!(method = %method, path = %full_path, order, "route registered");

        let link: BoxedMiddleware = Arc::new(TypedLink::new(
            handler,
            Arc::clone(&request),
            Arc::clone(&response),
            Arc::clone(&policy),
        ));
        blueprint.routes.push(RouteSpec {
            node: self.node,
            order,
            link,
            middleware: options.middleware,
            policy,
            record: RouteRecord::new(method, full_path, request, response, errors),
        });
        Ok(())
    }

    /// Registers a GET handler.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn get<Req, Resp, H>(&self, path: &str, handler: H) -> Result<(), SetupError>
    where
        Req: Schema + DeserializeOwned + Serialize + Default + Validate + Send + 'static,
        Resp: Schema + Serialize + Validate + Send + 'static,
        H: Handler<Req, Resp>,
    {
        self.handle(Method::GET, path, handler, RouteOptions::new())
    }

    /// Registers a POST handler.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn post<Req, Resp, H>(&self, path: &str, handler: H) -> Result<(), SetupError>
    where
        Req: Schema + DeserializeOwned + Serialize + Default + Validate + Send + 'static,
        Resp: Schema + Serialize + Validate + Send + 'static,
        H: Handler<Req, Resp>,
    {
        self.handle(Method::POST, path, handler, RouteOptions::new())
    }

    /// Registers a PUT handler.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn put<Req, Resp, H>(&self, path: &str, handler: H) -> Result<(), SetupError>
    where
        Req: Schema + DeserializeOwned + Serialize + Default + Validate + Send + 'static,
        Resp: Schema + Serialize + Validate + Send + 'static,
        H: Handler<Req, Resp>,
    {
        self.handle(Method::PUT, path, handler, RouteOptions::new())
    }

    /// Registers a PATCH handler.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn patch<Req, Resp, H>(&self, path: &str, handler: H) -> Result<(), SetupError>
    where
        Req: Schema + DeserializeOwned + Serialize + Default + Validate + Send + 'static,
        Resp: Schema + Serialize + Validate + Send + 'static,
        H: Handler<Req, Resp>,
    {
        self.handle(Method::PATCH, path, handler, RouteOptions::new())
    }

    /// Registers a DELETE handler.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn delete<Req, Resp, H>(&self, path: &str, handler: H) -> Result<(), SetupError>
    where
        Req: Schema + DeserializeOwned + Serialize + Default + Validate + Send + 'static,
        Resp: Schema + Serialize + Validate + Send + 'static,
        H: Handler<Req, Resp>,
    {
        self.handle(Method::DELETE, path, handler, RouteOptions::new())
    }

    /// Registration records for every route in the tree, in registration
    /// order.
    #[must_use]
    pub fn catalog(&self) -> Vec<RouteRecord> {
        self.blueprint
            .lock()
            .routes
            .iter()
            .map(|r| r.record.clone())
            .collect()
    }

    /// Compiles the whole tree, whichever node this handle points at, into
    /// a [`Service`].
    ///
    /// The router stays usable; routes added later need another freeze.
    ///
    /// # Errors
    ///
    /// Returns the first route the trie refuses.
    pub fn freeze(&self) -> Result<Service, SetupError> {
        Service::build(&self.blueprint.lock())
    }
}
