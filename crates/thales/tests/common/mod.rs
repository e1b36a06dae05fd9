//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use thales::prelude::*;
use thales_test::TestClient;

/// Names recorded in the order links ran.
pub type Trace = Arc<Mutex<Vec<&'static str>>>;

pub fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn names(trace: &Trace) -> Vec<&'static str> {
    trace.lock().unwrap().clone()
}

/// Freezes the whole tree and drives it in memory.
pub fn client(router: &Router) -> TestClient {
    let service = router.freeze().expect("router should freeze");
    TestClient::new(move |req| {
        let service = service.clone();
        async move { service.call(req).await }
    })
}

/// Middleware that records its name and continues.
pub fn tracer(trace: &Trace, name: &'static str) -> BoxedMiddleware {
    let trace = Arc::clone(trace);
    from_sync_fn(name, move |_| {
        trace.lock().unwrap().push(name);
        Flow::Continue
    })
}

/// Middleware that records its name, writes it as the body and halts.
pub fn writer(trace: &Trace, name: &'static str) -> BoxedMiddleware {
    let trace = Arc::clone(trace);
    from_sync_fn(name, move |ex| {
        trace.lock().unwrap().push(name);
        ex.response_mut().write(name.as_bytes());
        Flow::Halt
    })
}
