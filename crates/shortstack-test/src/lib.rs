//! # ShortStack Test
//!
//! In-memory request dispatch for testing ShortStack applications. No
//! sockets and no ports: requests go straight into a [`Stack`] or through
//! a [`StackService`] and its middleware pipeline.
//!
//! ## Key Features
//!
//! - **Request Builder**: headers, `Accept`, JSON and form bodies
//! - **Response Helpers**: `text()`, `json()` and chained assertions
//! - **Two Targets**: bare dispatch, or the full pipeline
//!
//! ## Example
//!
//! ```
//! use shortstack_core::{Format, Reply};
//! use shortstack_server::StackBuilder;
//! use shortstack_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let stack = StackBuilder::new()
//!     .provides(vec![Format::JSON])
//!     .get("/posts/:id", |c| {
//!         let id = c.param("id").unwrap_or_default().to_string();
//!         Ok(Reply::from(format!(r#"{{"id": "{id}"}}"#)))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let client = TestClient::new(stack);
//! let response = client.get("/posts/3").accept("application/json").send().await;
//!
//! response.assert_header("content-type", "application/json");
//! assert_eq!(response.json_value().unwrap()["id"], "3");
//! # });
//! ```
//!
//! [`Stack`]: shortstack_server::Stack
//! [`StackService`]: shortstack_server::StackService

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
