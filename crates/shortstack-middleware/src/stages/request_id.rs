//! Request ID stage.
//!
//! Assigns every request a UUID v7 [`RequestId`], opens a tracing span
//! carrying it, and echoes it in the `X-Request-ID` response header so
//! clients can correlate their requests with server logs.

use http::HeaderValue;
use shortstack_core::{Request, RequestId, REQUEST_ID_HEADER};
use shortstack_telemetry::logging::fields;
use tracing::Instrument;

use crate::middleware::{BoxFuture, Middleware, Next, Outcome};

/// Generates or propagates request ids.
///
/// By default incoming `X-Request-ID` headers are ignored and a fresh id is
/// generated. [`RequestIdMiddleware::trust_incoming`] reuses a well-formed
/// incoming id instead.
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Stage name.
    pub const NAME: &'static str = "request_id";

    /// A stage that always generates a new id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stage that reuses valid incoming ids.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn extract(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        request.header(REQUEST_ID_HEADER).and_then(RequestId::parse)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        let id = self.extract(&request).unwrap_or_default();
        request.set_request_id(id);

        let span = tracing::info_span!(
            "request",
            { fields::REQUEST_ID } = %id,
            { fields::HTTP_METHOD } = %request.method(),
            { fields::HTTP_PATH } = request.path(),
        );

        Box::pin(
            async move {
                let mut response = next.run(request).await?;
                if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
