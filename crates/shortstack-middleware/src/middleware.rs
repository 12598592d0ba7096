//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait every pipeline stage
//! implements. A stage receives the request and a [`Next`] handle; it may
//! adjust the request, call `next.run(request)` once, and adjust the outcome
//! on the way back, or short-circuit by returning its own outcome.
//!
//! Outcomes are `Result<Response, DispatchError>`: an `Err` is an error that
//! escaped the stack (interception disabled) and is still travelling
//! outwards, so an outer stage such as rescue can still turn it into a
//! response.
//!
//! # Example
//!
//! ```
//! use shortstack_middleware::{BoxFuture, Middleware, Next, Outcome};
//! use shortstack_core::Request;
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let outcome = next.run(request).await;
//!             tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "request timed");
//!             outcome
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use shortstack_core::{DispatchError, Request, Response};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a stage hands back outwards.
pub type Outcome = Result<Response, DispatchError>;

/// A pipeline stage.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once
/// - A stage never swallows a response it did not produce
pub trait Middleware: Send + Sync + 'static {
    /// Unique name of the stage, used to detect duplicates and in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome>;
}

/// Handle to the rest of the pipeline.
///
/// Consumed by [`Next::run`], so it can only be called once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More stages to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain: the stack itself
    Endpoint(Box<dyn FnOnce(Request) -> BoxFuture<'a, Outcome> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Wraps `next` with `middleware`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes `endpoint`.
    pub fn endpoint<F>(endpoint: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'a, Outcome> + Send + 'a,
    {
        Self {
            inner: NextInner::Endpoint(Box::new(endpoint)),
        }
    }

    /// Invokes the next stage or the endpoint.
    pub async fn run(self, request: Request) -> Outcome {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Endpoint(endpoint) => endpoint(request).await,
        }
    }
}

/// A stage built from a closure.
///
/// # Example
///
/// ```
/// use shortstack_middleware::FnMiddleware;
///
/// let passthrough = FnMiddleware::new("passthrough", |request, next| {
///     Box::pin(next.run(request))
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    /// Creates a new function-based stage.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        (self.func)(request, next)
    }
}
