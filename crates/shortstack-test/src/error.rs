//! Test error types.

use shortstack_core::DispatchError;
use thiserror::Error;

/// Errors that can occur while building or sending a test request.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// A header name or value was invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The response body was not what the caller asked for.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form encoding failed.
    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// The dispatch failed and error interception was off.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}
