//! Core types for ShortStack.
//!
//! This crate holds the vocabulary shared by every other crate:
//!
//! - [`HttpError`] and [`DispatchError`]: what a dispatch can fail with
//! - [`Format`] and [`MimeTable`]: response formats and their media types
//! - [`negotiate`]: picking a format from extensions, params and `Accept`
//! - [`Request`] / [`ParamMap`]: the inbound side
//! - [`Response`] / [`ResponseBuilder`] / [`Body`]: the outbound side
//! - [`Reply`] / [`Abort`] / [`ActionResult`]: what handlers return
//! - [`Renderer`] / [`MiniJinjaRenderer`]: template rendering
//! - [`Layout`] / [`TemplateLayout`]: layout wrapping
//! - [`RequestId`]: time-ordered request identifiers

pub mod error;
pub mod format;
pub mod layout;
pub mod negotiate;
pub mod render;
pub mod reply;
pub mod request;
pub mod request_id;
pub mod response;

pub use error::{DispatchError, HttpError, HttpResult};
pub use format::{Format, MimeTable, MimeType};
pub use layout::{Layout, TemplateLayout};
pub use render::{MiniJinjaRenderer, RenderError, Renderer};
pub use reply::{Abort, ActionResult, Reply};
pub use request::{ParamMap, ParamValue, Request};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use response::{Body, Response, ResponseBuilder};
