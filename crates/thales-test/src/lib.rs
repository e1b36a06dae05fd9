//! # Thales Test
//!
//! In-memory testing for Thales services. Requests go through the full
//! dispatch path, middleware included, without binding a port.
//!
//! ```ignore
//! use thales_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn creates_user() {
//!     let service = app().freeze().unwrap();
//!     let client = TestClient::new(move |req| {
//!         let service = service.clone();
//!         async move { service.call(req).await }
//!     });
//!
//!     client
//!         .post("/users")
//!         .json(&json!({"name": "Ada"}))
//!         .send()
//!         .await
//!         .assert_status_code(201)
//!         .assert_json_field("name", &json!("Ada"));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/thales-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, TestHandler};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
