//! Layout stage.
//!
//! Gives every request a [`TemplateLayout`] backed by the stack's renderer,
//! unless an outer stage already installed one.

use std::sync::Arc;

use shortstack_core::{Renderer, Request, TemplateLayout};

use crate::middleware::{BoxFuture, Middleware, Next, Outcome};

/// Installs a per-request layout.
pub struct LayoutMiddleware {
    renderer: Arc<dyn Renderer>,
}

impl LayoutMiddleware {
    /// Stage name.
    pub const NAME: &'static str = "layout";

    /// Layouts render through `renderer`.
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }
}

impl Middleware for LayoutMiddleware {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        if request.layout().is_none() {
            request.set_layout(Box::new(TemplateLayout::new(Arc::clone(&self.renderer))));
        }
        Box::pin(next.run(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use shortstack_core::{Layout, MiniJinjaRenderer, Response};

    struct Fixed;

    impl Layout for Fixed {
        fn template_name(&self) -> Option<&str> {
            Some("fixed")
        }
        fn set_template_name(&mut self, _name: String) {}
        fn format(&self) -> Option<&shortstack_core::Format> {
            None
        }
        fn set_format(&mut self, _format: shortstack_core::Format) {}
        fn content(&self) -> Option<&str> {
            None
        }
        fn set_content(&mut self, _content: String) {}
        fn render(&self) -> Result<String, shortstack_core::RenderError> {
            Ok(String::new())
        }
    }

    fn layout_name_endpoint<'a>() -> Next<'a> {
        Next::endpoint(|request: Request| {
            let name = request
                .layout()
                .map(|l| l.template_name().unwrap_or("none").to_string())
                .unwrap_or_else(|| "missing".to_string());
            Box::pin(async move { Ok(Response::text(StatusCode::OK, name)) })
        })
    }

    fn body(response: Response) -> String {
        String::from_utf8(response.into_parts().2.into_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_installs_layout() {
        let stage = LayoutMiddleware::new(Arc::new(MiniJinjaRenderer::new()));
        let response = stage
            .process(Request::new(Method::GET, "/"), layout_name_endpoint())
            .await
            .unwrap();
        assert_eq!(body(response), "none");
    }

    #[tokio::test]
    async fn test_keeps_existing_layout() {
        let stage = LayoutMiddleware::new(Arc::new(MiniJinjaRenderer::new()));
        let request = Request::new(Method::GET, "/").with_layout(Box::new(Fixed));
        let response = stage.process(request, layout_name_endpoint()).await.unwrap();
        assert_eq!(body(response), "fixed");
    }
}
