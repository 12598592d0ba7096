//! Handler results.
//!
//! A handler returns [`ActionResult`]: `Ok(Reply)` when it completes, or
//! `Err(Abort)` when it halts early or fails. Any standard error converts
//! into [`Abort`], so handlers can use `?` freely; a typed
//! [`HttpError`](crate::HttpError) raised this way keeps its status.

use std::fmt::Display;

use crate::response::{Response, ResponseBuilder};

/// What a handler produced.
#[derive(Debug)]
pub enum Reply {
    /// A complete response, passed through untouched.
    Raw(Response),
    /// A response under construction, finished before sending.
    Built(ResponseBuilder),
    /// Rendered content, wrapped in the layout when one is active.
    Text(String),
    /// Any other value, already stringified; never wrapped.
    Value(String),
    /// No value; an empty body.
    Nothing,
}

impl Reply {
    /// Stringifies a value that is not page content.
    #[must_use]
    pub fn value(value: impl Display) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::Nothing
    }
}

impl From<Option<String>> for Reply {
    fn from(text: Option<String>) -> Self {
        text.map_or(Self::Nothing, Self::Text)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Raw(response)
    }
}

impl From<ResponseBuilder> for Reply {
    fn from(builder: ResponseBuilder) -> Self {
        Self::Built(builder)
    }
}

/// Why a handler stopped without completing.
#[derive(Debug)]
pub enum Abort {
    /// Stop now and answer with the current status and headers, plus an
    /// optional body.
    Halt(Option<String>),
    /// Fail with an error.
    Raise(anyhow::Error),
}

impl Abort {
    /// A halt with an empty body.
    #[must_use]
    pub fn halt() -> Self {
        Self::Halt(None)
    }

    /// A halt with `body`.
    #[must_use]
    pub fn halt_with(body: impl Into<String>) -> Self {
        Self::Halt(Some(body.into()))
    }

    /// Fails with an arbitrary error value.
    #[must_use]
    pub fn raise(error: anyhow::Error) -> Self {
        Self::Raise(error)
    }
}

impl<E> From<E> for Abort
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::Raise(anyhow::Error::new(error))
    }
}

/// What every handler returns.
pub type ActionResult = Result<Reply, Abort>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;

    fn parse(input: &str) -> Result<u32, Abort> {
        Ok(input.parse::<u32>()?)
    }

    fn guarded() -> ActionResult {
        Err(HttpError::not_found("gone"))?
    }

    #[test]
    fn test_question_mark_raises() {
        assert!(matches!(parse("nope"), Err(Abort::Raise(_))));
        assert_eq!(parse("7").ok(), Some(7));
    }

    #[test]
    fn test_http_error_survives_conversion() {
        let Err(Abort::Raise(err)) = guarded() else {
            panic!("expected a raise");
        };
        let http = err.downcast::<HttpError>().unwrap();
        assert_eq!(http.code(), 404);
    }

    #[test]
    fn test_reply_conversions() {
        assert!(matches!(Reply::from("hi"), Reply::Text(t) if t == "hi"));
        assert!(matches!(Reply::from(()), Reply::Nothing));
        assert!(matches!(Reply::from(None::<String>), Reply::Nothing));
        assert!(matches!(Reply::value(42), Reply::Value(v) if v == "42"));
    }

    #[test]
    fn test_halt_constructors() {
        assert!(matches!(Abort::halt(), Abort::Halt(None)));
        assert!(matches!(Abort::halt_with("done"), Abort::Halt(Some(b)) if b == "done"));
    }
}
