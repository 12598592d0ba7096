//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] wraps a stack endpoint in an ordered list of stages. The
//! first stage added is the outermost: it sees the request first and the
//! outcome last.
//!
//! [`PipelineBuilder::with_defaults`] installs the standard stages a stack
//! needs when they are not already present:
//!
//! ```text
//! Request → request_id → rescue → (user stages) → layout → Stack
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use shortstack_core::{Renderer, Request};

use crate::middleware::{BoxFuture, Middleware, Next, Outcome};
use crate::stages::{LayoutMiddleware, RequestIdMiddleware, RescueMiddleware};

/// A type-erased stage that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of stages.
///
/// # Example
///
/// ```
/// use shortstack_middleware::{Pipeline, RequestIdMiddleware};
///
/// let pipeline = Pipeline::builder()
///     .stage(RequestIdMiddleware::new())
///     .build();
/// assert_eq!(pipeline.stage_names(), vec!["request_id"]);
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every stage and then `endpoint`.
    pub async fn process<'a, E>(&'a self, request: Request, endpoint: E) -> Outcome
    where
        E: FnOnce(Request) -> BoxFuture<'a, Outcome> + Send + 'a,
    {
        self.build_chain(endpoint).run(request).await
    }

    fn build_chain<'a, E>(&'a self, endpoint: E) -> Next<'a>
    where
        E: FnOnce(Request) -> BoxFuture<'a, Outcome> + Send + 'a,
    {
        let mut next = Next::endpoint(endpoint);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Names of all stages, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
    defaults: Option<Arc<dyn Renderer>>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(self, middleware: M) -> Self {
        self.boxed(Arc::new(middleware))
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Installs the request id, rescue and layout stages at build time,
    /// unless stages with those names were added explicitly.
    ///
    /// `renderer` renders the rescue error view and backs the layouts.
    #[must_use]
    pub fn with_defaults(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.defaults = Some(renderer);
        self
    }

    /// Builds the pipeline.
    ///
    /// Stage names are unique; a later stage with an already used name is
    /// dropped.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let Self { mut stages, defaults } = self;

        if let Some(renderer) = defaults {
            let has = |stages: &[BoxedMiddleware], name: &str| stages.iter().any(|m| m.name() == name);

            if !has(&stages, RescueMiddleware::NAME) {
                stages.insert(0, Arc::new(RescueMiddleware::new(Some(Arc::clone(&renderer)))));
            }
            if !has(&stages, RequestIdMiddleware::NAME) {
                stages.insert(0, Arc::new(RequestIdMiddleware::new()));
            }
            if !has(&stages, LayoutMiddleware::NAME) {
                stages.push(Arc::new(LayoutMiddleware::new(renderer)));
            }
        }

        let mut seen = HashSet::new();
        stages.retain(|m| {
            let fresh = seen.insert(m.name());
            if !fresh {
                tracing::warn!(stage = m.name(), "duplicate middleware stage dropped");
            }
            fresh
        });

        Pipeline { stages }
    }
}
