//! # ShortStack
//!
//! **An MVC request dispatch core.**
//!
//! ShortStack takes a request, finds the action that answers it, works out
//! which response format the client gets, runs the handler and turns
//! whatever it produced (text, a built response, a halt or an error) into
//! a finished response.
//!
//! - **Two-phase stacks**: routes and actions are declared on a
//!   [`StackBuilder`](server::StackBuilder), then frozen into a
//!   [`Stack`](server::Stack)
//! - **Explicit visibility**: only published actions are reachable
//! - **Content negotiation**: path extensions, a `format` parameter and
//!   `Accept` resolved against per-action format declarations
//! - **Error normalization**: typed HTTP errors and raw failures rendered
//!   through a per-scope exception handler or the built-in error view
//! - **Composition**: sub-stacks mounted under a prefix inherit formats,
//!   handlers and helpers
//!
//! ## Quick Start
//!
//! ```
//! use shortstack::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let stack = StackBuilder::new()
//!     .provides(vec![Format::JSON, Format::TEXT])
//!     .get("/posts/featured", |_c| Ok(Reply::from("featured")))
//!     .get("/posts/:id", |c| {
//!         let id = c.param("id").unwrap_or_default().to_string();
//!         Ok(Reply::from(format!("post {id}")))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let service = StackService::new(stack);
//! let response = service
//!     .call(Request::new(http::Method::GET, "/posts/featured"))
//!     .await
//!     .unwrap();
//! assert_eq!(response.headers()["content-type"], "application/json");
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → Rescue → Layout → Stack::call
//!                                            │
//!                          route → negotiate → handler → normalize
//!                                                              ↓
//! Response ←──────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]

pub use shortstack_config as config;
pub use shortstack_core as core;
pub use shortstack_middleware as middleware;
pub use shortstack_router as router;
pub use shortstack_server as server;
pub use shortstack_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use shortstack::prelude::*;
/// ```
pub mod prelude {
    pub use shortstack_config::{ConfigLoader, DispatchConfig, ShortStackConfig};

    pub use shortstack_core::{
        Abort, ActionResult, DispatchError, Format, HttpError, HttpResult, Layout, MimeTable,
        MiniJinjaRenderer, Renderer, Reply, Request, RequestId, Response, ResponseBuilder,
    };

    pub use shortstack_middleware::{Middleware, Pipeline};

    pub use shortstack_server::{
        Controller, RouteOptions, SetupError, Stack, StackBuilder, StackService,
    };

    pub use shortstack_telemetry::{init_logging, LogConfig};
}
