//! # ShortStack Server
//!
//! Stacks, controllers and dispatch.
//!
//! A [`Stack`] bundles a route table, the actions the routes lead to and
//! the settings used to serve them. It is configured with
//! [`StackBuilder`] and then frozen. Each request gets a fresh
//! [`Controller`] that the action handler reads the request from and
//! writes the response into.
//!
//! | Module | Contents |
//! |---|---|
//! | [`stack`] | `StackBuilder`, `Stack`, `RouteOptions`, mounting and inheritance |
//! | [`registry`] | action definitions and the publish allow-list |
//! | [`controller`] | the per-request `Controller` |
//! | [`helpers`] | typed helper values shared by a stack's handlers |
//! | [`service`] | `StackService`, the async adapter over a middleware pipeline |
//!
//! ## Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use shortstack_core::{Abort, Format, HttpError, Reply, Request};
//! use shortstack_server::StackBuilder;
//!
//! let stack = StackBuilder::new()
//!     .provides(vec![Format::JSON, Format::TEXT])
//!     .get("/posts/:id(.:format)", |c| match c.param("id") {
//!         Some("1") => Ok(Reply::from("first post")),
//!         _ => Err(HttpError::not_found("no such post"))?,
//!     })
//!     .get("/drafts", |c| {
//!         c.set_status(StatusCode::FORBIDDEN);
//!         Err(Abort::halt())
//!     })
//!     .handle_exception(|_c, err| Reply::from(format!("oops: {}", err.name())))
//!     .build()
//!     .unwrap();
//!
//! let ok = stack.call(Request::new(Method::GET, "/posts/1.text")).unwrap();
//! assert_eq!(ok.status(), StatusCode::OK);
//!
//! let missing = stack.call(Request::new(Method::GET, "/posts/2")).unwrap();
//! assert_eq!(missing.status(), StatusCode::NOT_FOUND);
//!
//! let halted = stack.call(Request::new(Method::GET, "/drafts")).unwrap();
//! assert_eq!(halted.status(), StatusCode::FORBIDDEN);
//! assert!(halted.body().is_empty());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod controller;
mod dispatcher;
pub mod error;
pub mod helpers;
pub mod registry;
pub mod service;
pub mod stack;

pub use controller::Controller;
pub use error::SetupError;
pub use helpers::Helpers;
pub use registry::{Action, ActionHandler, ActionRegistry, ExceptionHandler};
pub use service::StackService;
pub use stack::{RouteOptions, Stack, StackBuilder, Target};
