//! Typed handlers and the chain link that runs them.
//!
//! A handler is any async function `(RequestContext, Req) -> Result<Resp,
//! HandlerError>`. Registration wraps it in a [`TypedLink`], the middleware
//! that binds and validates `Req`, calls the handler, and validates and
//! writes whatever comes back.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thales_core::{Error, ErrorKind, HandlerError, RequestContext, TypeDescriptor, Validate};
use thales_extract::{bind, project, ExtractionContext};
use thales_middleware::{BoxFuture, Exchange, Flow, Middleware};

use crate::classify::ErrorPolicy;

/// An async request handler.
///
/// Implemented for every `Fn(RequestContext, Req) -> impl Future<Output =
/// Result<Resp, HandlerError>>` that is `Send + Sync + 'static`.
///
/// ```ignore
/// async fn get_user(ctx: RequestContext, req: GetUser) -> Result<User, HandlerError> {
///     Ok(User { id: req.user_id, name: "Ada".into() })
/// }
/// ```
pub trait Handler<Req, Resp>: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, ctx: RequestContext, request: Req) -> BoxFuture<'static, Result<Resp, HandlerError>>;
}

impl<F, Fut, Req, Resp> Handler<Req, Resp> for F
where
    F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Req) -> BoxFuture<'static, Result<Resp, HandlerError>> {
        Box::pin(self(ctx, request))
    }
}

/// The handler step of a route chain.
///
/// Returns `Halt` once a response or error was written, and `Continue` when
/// the handler delegates.
pub(crate) struct TypedLink<Req, Resp, H> {
    handler: H,
    request: Arc<TypeDescriptor>,
    response: Arc<TypeDescriptor>,
    policy: Arc<ErrorPolicy>,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, H> TypedLink<Req, Resp, H> {
    pub(crate) fn new(
        handler: H,
        request: Arc<TypeDescriptor>,
        response: Arc<TypeDescriptor>,
        policy: Arc<ErrorPolicy>,
    ) -> Self {
        Self {
            handler,
            request,
            response,
            policy,
            _types: PhantomData,
        }
    }
}

impl<Req, Resp, H> TypedLink<Req, Resp, H>
where
    Req: DeserializeOwned + Serialize + Default + Validate,
    Resp: Serialize + Validate,
{
    fn bind_request(&self, ex: &Exchange) -> Result<Req, Error> {
        let ctx = ExtractionContext::new(ex.parts(), ex.body(), ex.params());
        let request: Req = bind(&ctx, &self.request)?;
        request.validate().map_err(|violations| {
            Error::new(ErrorKind::Validation, "request validation failed").with_source(violations)
        })?;
        Ok(request)
    }

    fn write_response(&self, ex: &mut Exchange, response: &Resp) {
        if let Err(violations) = response.validate() {
            return self.policy.fail(
                ex,
                Error::new(ErrorKind::ResponseValidation, "response validation failed")
                    .with_source(violations),
            );
        }
        match project(response, &self.response) {
            Ok(projection) => self.policy.write_projection(
                ex,
                projection,
                StatusCode::OK,
                "failed to encode response",
            ),
            Err(e) => self.policy.fail(
                ex,
                Error::new(ErrorKind::Serialization, "failed to encode response").with_source(e),
            ),
        }
    }
}

impl<Req, Resp, H> Middleware for TypedLink<Req, Resp, H>
where
    Req: DeserializeOwned + Serialize + Default + Validate + Send + 'static,
    Resp: Serialize + Validate + Send + 'static,
    H: Handler<Req, Resp>,
{
    fn name(&self) -> &'static str {
        "handler"
    }

    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, Flow> {
        Box::pin(async move {
            let request = match self.bind_request(ex) {
                Ok(request) => request,
                Err(err) => {
                    self.policy.fail(ex, err);
                    return Flow::Halt;
                }
            };
            let outcome = self.handler.call(ex.to_request_context(), request).await;
            match outcome {
                Ok(response) => self.write_response(ex, &response),
                Err(HandlerError::Delegate) => return Flow::Continue,
                Err(HandlerError::Failed(failure)) => self.policy.handler_failure(ex, failure),
            }
            Flow::Halt
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use thales_core::{descriptor_of, Empty, NoContent, Schema, SchemaBuilder, Violations};
    use thales_router::Params;

    use crate::config::RouterConfig;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct GetUser {
        user_id: String,
        page: i64,
    }

    impl Schema for GetUser {
        fn describe(schema: &mut SchemaBuilder) {
            schema.path::<String>("user_id", "id");
            schema.query::<i64>("page", "page");
        }
    }

    impl Validate for GetUser {
        fn validate(&self) -> Result<(), Violations> {
            let mut v = Violations::new();
            v.require(self.page >= 0, "page", "must not be negative");
            v.into_result()
        }
    }

    #[derive(Debug, Serialize)]
    struct User {
        id: String,
        page: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        etag: Option<String>,
    }

    impl Schema for User {
        fn describe(schema: &mut SchemaBuilder) {
            schema.header::<String>("etag", "ETag");
        }
    }

    impl Validate for User {
        fn validate(&self) -> Result<(), Violations> {
            let mut v = Violations::new();
            v.require(!self.id.is_empty(), "id", "is required");
            v.into_result()
        }
    }

    fn link<Req, Resp, H>(handler: H) -> TypedLink<Req, Resp, H>
    where
        Req: Schema,
        Resp: Schema,
    {
        TypedLink::new(
            handler,
            descriptor_of::<Req>().unwrap(),
            descriptor_of::<Resp>().unwrap(),
            Arc::new(ErrorPolicy::new(&RouterConfig::new(), Vec::new())),
        )
    }

    fn exchange(method: &str, uri: &str, id: &str) -> Exchange {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        let mut ex = Exchange::new(parts, Bytes::new());
        ex.set_params([("id", id)].into_iter().collect::<Params>());
        ex
    }

    async fn body_of(ex: Exchange) -> (StatusCode, http::HeaderMap, String) {
        let response = ex.into_response();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn show(_ctx: RequestContext, req: GetUser) -> Result<User, HandlerError> {
        Ok(User {
            id: req.user_id,
            page: req.page,
            etag: Some("v1".into()),
        })
    }

    #[tokio::test]
    async fn test_binds_invokes_and_writes() {
        let link = link::<GetUser, User, _>(show);
        let mut ex = exchange("GET", "/users/7?page=2", "7");
        assert!(matches!(link.call(&mut ex).await, Flow::Halt));
        let (status, headers, body) = body_of(ex).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["etag"], "v1");
        assert_eq!(body, r#"{"id":"7","page":2}"#);
    }

    #[tokio::test]
    async fn test_parse_failure_skips_handler() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let link = link::<GetUser, User, _>(move |ctx: RequestContext, req: GetUser| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            show(ctx, req)
        });
        let mut ex = exchange("GET", "/users/7?page=abc", "7");
        link.call(&mut ex).await;
        let (status, _, body) = body_of(ex).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("parse_error: invalid query parameter 'page'"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_validation_failure() {
        let link = link::<GetUser, User, _>(show);
        let mut ex = exchange("GET", "/users/7?page=-1", "7");
        link.call(&mut ex).await;
        let (status, _, body) = body_of(ex).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("validation_error: request validation failed"));
    }

    #[tokio::test]
    async fn test_invalid_response_is_not_sent() {
        let link = link::<GetUser, User, _>(|_ctx: RequestContext, _req: GetUser| async {
            Ok(User { id: String::new(), page: 0, etag: None })
        });
        let mut ex = exchange("GET", "/users/7", "7");
        link.call(&mut ex).await;
        let (status, _, body) = body_of(ex).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("response_validation_error: response validation failed"));
    }

    #[tokio::test]
    async fn test_delegate_continues_without_writing() {
        let link = link::<Empty, Empty, _>(|_ctx: RequestContext, _req: Empty| async {
            Err::<Empty, _>(HandlerError::Delegate)
        });
        let mut ex = exchange("GET", "/", "");
        assert!(matches!(link.call(&mut ex).await, Flow::Continue));
        assert!(!ex.response().is_committed());
    }

    #[tokio::test]
    async fn test_no_content_has_no_body() {
        let link = link::<Empty, NoContent, _>(|_ctx: RequestContext, _req: Empty| async {
            Ok(NoContent::default())
        });
        let mut ex = exchange("DELETE", "/", "");
        link.call(&mut ex).await;
        let (status, headers, body) = body_of(ex).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_empty_response_is_empty_object() {
        let link = link::<Empty, Empty, _>(|_ctx: RequestContext, _req: Empty| async {
            Ok(Empty::default())
        });
        let mut ex = exchange("GET", "/", "");
        link.call(&mut ex).await;
        let (_, _, body) = body_of(ex).await;
        assert_eq!(body, "{}");
    }
}
