//! Last-resort error rendering.
//!
//! When a stack runs with error interception disabled, failures leave it as
//! `Err(DispatchError)`. The rescue stage turns them into a response so the
//! client still gets a status and the `error` view, in HTML, JSON or plain
//! text depending on `Accept`.

use std::sync::Arc;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use shortstack_core::negotiate::negotiate;
use shortstack_core::{Format, HttpError, MimeTable, Renderer, Request, Response};
use shortstack_telemetry::logging::fields;

use crate::middleware::{BoxFuture, Middleware, Next, Outcome};

const RESCUE_FORMATS: [Format; 3] = [Format::HTML, Format::JSON, Format::TEXT];

/// Converts escaped dispatch errors into error responses.
pub struct RescueMiddleware {
    renderer: Option<Arc<dyn Renderer>>,
    table: MimeTable,
}

impl RescueMiddleware {
    /// Stage name.
    pub const NAME: &'static str = "rescue";

    /// Renders through `renderer`; without one, bodies are `"<code> <name>"`.
    #[must_use]
    pub fn new(renderer: Option<Arc<dyn Renderer>>) -> Self {
        Self {
            renderer,
            table: MimeTable::default(),
        }
    }

    fn respond(&self, error: &HttpError, accept: Option<&str>) -> Response {
        let format = negotiate(&self.table, &RESCUE_FORMATS, accept, None).unwrap_or(Format::TEXT);

        let rendered = self.renderer.as_ref().and_then(|renderer| {
            renderer
                .render("error", Some(&format), &error.view_bindings())
                .map_err(|err| tracing::warn!(error = %err, "error view failed to render"))
                .ok()
        });
        let (format, body) = match rendered {
            Some(body) => (format, body),
            None => (Format::TEXT, format!("{} {}", error.code(), error.name())),
        };

        let mut headers = HeaderMap::new();
        if let Some(content_type) = self.table.content_type(&format) {
            if let Ok(value) = HeaderValue::from_str(content_type) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        Response::new(error.status(), headers, body)
    }
}

impl Middleware for RescueMiddleware {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        let accept = request.header_list("accept");
        Box::pin(async move {
            match next.run(request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    let error = err.into_http();
                    tracing::error!(
                        { fields::HTTP_STATUS_CODE } = error.code(),
                        error = %error,
                        "escaped dispatch error rescued"
                    );
                    Ok(self.respond(&error, accept.as_deref()))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use shortstack_core::{DispatchError, MiniJinjaRenderer};

    fn failing<'a>(error: DispatchError) -> Next<'a> {
        Next::endpoint(move |_request| Box::pin(async move { Err(error) }))
    }

    fn body(response: Response) -> String {
        String::from_utf8(response.into_parts().2.into_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_passes_responses_through() {
        let stage = RescueMiddleware::new(None);
        let next = Next::endpoint(|_request| {
            Box::pin(async { Ok(Response::text(StatusCode::CREATED, "made")) })
        });
        let response = stage.process(Request::new(Method::GET, "/"), next).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_plain_fallback_without_renderer() {
        let stage = RescueMiddleware::new(None);
        let response = stage
            .process(
                Request::new(Method::GET, "/"),
                failing(HttpError::not_found("gone").into()),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body(response), "404 Not Found");
    }

    #[tokio::test]
    async fn test_raw_errors_become_500() {
        let stage = RescueMiddleware::new(Some(Arc::new(MiniJinjaRenderer::new())));
        let response = stage
            .process(
                Request::new(Method::GET, "/"),
                failing(anyhow::anyhow!("secret detail").into()),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body(response).contains("secret detail"));
    }

    #[tokio::test]
    async fn test_renders_json_when_accepted() {
        let stage = RescueMiddleware::new(Some(Arc::new(MiniJinjaRenderer::new())));
        let request = Request::new(Method::GET, "/")
            .with_header("accept", HeaderValue::from_static("application/json"));
        let response = stage
            .process(request, failing(HttpError::not_acceptable("nope").into()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let parsed: serde_json::Value = serde_json::from_str(&body(response)).unwrap();
        assert_eq!(parsed["status"], 406);
    }
}
