//! # ShortStack Middleware
//!
//! The async pipeline a stack runs inside.
//!
//! ```text
//! Request → request_id → rescue → (user stages) → layout → Stack
//!                                                            ↓
//! Response ← request_id ← rescue ←───────────────────────────┘
//! ```
//!
//! | Stage        | Purpose                                                  |
//! |--------------|----------------------------------------------------------|
//! | `request_id` | Assign a UUID v7 id, open the request span, echo header  |
//! | `rescue`     | Render errors that escaped the stack                     |
//! | `layout`     | Install a per-request [`TemplateLayout`]                 |
//!
//! Stages are ordinary [`Middleware`] values; [`FnMiddleware`] adapts a
//! closure.
//!
//! [`TemplateLayout`]: shortstack_core::TemplateLayout

#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next, Outcome};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::{LayoutMiddleware, RequestIdMiddleware, RescueMiddleware};
