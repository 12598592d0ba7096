//! The async adapter around a stack.
//!
//! [`StackService`] runs requests through a middleware [`Pipeline`] and
//! then the stack. It is the entry point an HTTP listener (or a test
//! client) talks to; the stack itself stays synchronous.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use shortstack_core::{Request, Response};
use shortstack_middleware::{Outcome, Pipeline};

use crate::stack::Stack;

/// A stack behind a middleware pipeline.
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use shortstack_core::{Reply, Request};
/// use shortstack_server::{StackBuilder, StackService};
///
/// # tokio_test::block_on(async {
/// let stack = StackBuilder::new().get("/", |_c| Ok(Reply::from("hi"))).build().unwrap();
/// let service = StackService::new(stack);
///
/// let response = service.call(Request::new(Method::GET, "/")).await.unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert!(response.headers().contains_key("x-request-id"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct StackService {
    stack: Stack,
    pipeline: Arc<Pipeline>,
}

impl StackService {
    /// Wraps `stack` in the default pipeline: request ids, rescue and
    /// layouts, all rendering through the stack's renderer.
    #[must_use]
    pub fn new(stack: Stack) -> Self {
        let pipeline = Pipeline::builder().with_defaults(stack.renderer()).build();
        Self::with_pipeline(stack, pipeline)
    }

    /// Wraps `stack` in a custom pipeline.
    #[must_use]
    pub fn with_pipeline(stack: Stack, pipeline: Pipeline) -> Self {
        Self {
            stack,
            pipeline: Arc::new(pipeline),
        }
    }

    /// The wrapped stack.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs `request` through the pipeline and the stack.
    pub async fn call(&self, request: Request) -> Outcome {
        let stack = self.stack.clone();
        self.pipeline
            .process(request, move |request| {
                Box::pin(async move { stack.call(request) })
            })
            .await
    }

    /// Serves a buffered `http` request.
    ///
    /// Errors that escape the pipeline become a plain-text response with
    /// their status.
    pub async fn call_http(&self, request: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        match self.call(Request::from_http(request)).await {
            Ok(response) => response.into_http(),
            Err(err) => {
                let status = err.status();
                tracing::error!(error = %err, status = status.as_u16(), "dispatch error escaped the pipeline");
                let reason = status.canonical_reason().unwrap_or("Error");
                Response::text(status, format!("{} {reason}", status.as_u16())).into_http()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use shortstack_config::DispatchConfig;
    use shortstack_core::{Abort, Format, MiniJinjaRenderer, Reply};
    use shortstack_middleware::stages::RequestIdMiddleware;

    use crate::StackBuilder;

    fn strict() -> DispatchConfig {
        DispatchConfig {
            handle_errors: false,
            ..DispatchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_rescue_catches_propagated_errors() {
        let stack = StackBuilder::new()
            .dispatch_config(strict())
            .get("/", |_c| Err(Abort::raise(anyhow::anyhow!("boom"))))
            .build()
            .unwrap();
        let service = StackService::new(stack);

        let request = Request::new(Method::GET, "/")
            .with_header("accept", http::HeaderValue::from_static("application/json"));
        let response = service.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_default_layout_applied_through_pipeline() {
        let mut renderer = MiniJinjaRenderer::new();
        renderer
            .add_template("layouts/site.html", "<main>{{ content|safe }}</main>")
            .unwrap();
        let stack = StackBuilder::new()
            .renderer(renderer)
            .default_layout("site")
            .provides(vec![Format::HTML])
            .get("/", |_c| Ok(Reply::from("<p>hi</p>")))
            .get("/raw", |_c| Ok(Reply::value("<p>raw</p>")))
            .build()
            .unwrap();
        let service = StackService::new(stack);

        let response = service.call(Request::new(Method::GET, "/")).await.unwrap();
        assert_eq!(response.into_parts().2.into_bytes(), "<main><p>hi</p></main>");

        let response = service.call(Request::new(Method::GET, "/raw")).await.unwrap();
        assert_eq!(response.into_parts().2.into_bytes(), "<p>raw</p>");
    }

    #[tokio::test]
    async fn test_custom_pipeline() {
        let stack = StackBuilder::new()
            .get("/", |_c| Ok(Reply::from("hi")))
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().stage(RequestIdMiddleware::new()).build();
        let service = StackService::with_pipeline(stack, pipeline);

        assert_eq!(service.pipeline().stage_names(), vec!["request_id"]);
        let response = service.call(Request::new(Method::GET, "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_call_http_round_trip() {
        let stack = StackBuilder::new()
            .post("/echo", |c| {
                Ok(Reply::from(c.param("name").unwrap_or("?").to_string()))
            })
            .build()
            .unwrap();
        let service = StackService::new(stack);

        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Bytes::from_static(b"name=ada"))
            .unwrap();
        let response = service.call_http(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "ada");
    }

    #[tokio::test]
    async fn test_call_http_without_rescue() {
        let stack = StackBuilder::new().dispatch_config(strict()).build().unwrap();
        let service = StackService::with_pipeline(stack, Pipeline::builder().build());

        let request = http::Request::builder()
            .uri("/nowhere")
            .body(Bytes::new())
            .unwrap();
        let response = service.call_http(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "404 Not Found");
    }
}
