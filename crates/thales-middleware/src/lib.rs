//! # Thales Middleware
//!
//! Hierarchical middleware dispatch for Thales.
//!
//! Every route gets one precomputed [`Chain`]:
//!
//! ```text
//! ancestor layers (order < route) → route-scoped middleware → handler → ancestor layers (order ≥ route)
//! ```
//!
//! Each link receives the request's [`Exchange`] and answers with a [`Flow`]:
//!
//! | Flow | Effect |
//! |------|--------|
//! | `Continue` | run the next link |
//! | `Delegate` | run the next link and skip the handler if it has not run |
//! | `Fail` | stop; the caller classifies the failure |
//! | `Halt` | stop; the response is complete |
//!
//! The typed handler halts after writing its response and continues when it
//! delegates, so middleware registered after a route only runs for handlers
//! that hand the response off.

#![doc(html_root_url = "https://docs.rs/thales-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod exchange;
pub mod middleware;
pub mod order;
pub mod types;

pub use chain::{Chain, ChainBuilder, Link};
pub use exchange::{status_allows_body, Exchange, ResponseWriter};
pub use middleware::{from_fn, from_sync_fn, BoxFuture, BoxedMiddleware, Flow, FnMiddleware, Middleware};
pub use order::Layer;
pub use types::{Request, Response};

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_partitioned_layers_wrap_handler() {
        let trace: Arc<Mutex<Vec<String>>> = Arc::default();
        let mw = |name: &'static str, write: bool| {
            let trace = Arc::clone(&trace);
            from_sync_fn(name, move |ex| {
                trace.lock().unwrap().push(name.to_string());
                if write {
                    ex.response_mut().write(name.as_bytes());
                    Flow::Halt
                } else {
                    Flow::Continue
                }
            })
        };

        // mw1 and mw2 registered at 0 and 1, the route at 2, mw3 at 3.
        let layers = vec![
            Layer::new(3, mw("mw3", true)),
            Layer::new(0, mw("mw1", false)),
            Layer::new(1, mw("mw2", false)),
        ];
        let (before, after) = order::partition(order::sorted(&layers), 2);
        let chain = Chain::builder()
            .layers(before)
            .handler(mw("handler", false))
            .layers(after)
            .build();

        let request = http::Request::get("/").body(Full::new(Bytes::new())).unwrap();
        let mut ex = Exchange::read(request).await;
        chain.run(&mut ex).await.unwrap();

        assert_eq!(*trace.lock().unwrap(), vec!["mw1", "mw2", "handler", "mw3"]);
        let body = ex.into_response().into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "mw3");
    }
}
