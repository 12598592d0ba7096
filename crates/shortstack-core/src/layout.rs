//! Layout wrapping.
//!
//! A [`Layout`] is an optional per-request service: handlers (and the
//! dispatcher) hand it page content, and it renders that content inside a
//! named template. With no template name set it passes content through.

use std::sync::Arc;

use serde_json::json;

use crate::format::Format;
use crate::render::{RenderError, Renderer};

/// Directory prefix for layout templates.
pub const LAYOUT_PREFIX: &str = "layouts/";

/// A per-request layout.
pub trait Layout: Send {
    /// The layout template, if one is chosen.
    fn template_name(&self) -> Option<&str>;

    /// Chooses the layout template.
    fn set_template_name(&mut self, name: String);

    /// The format the layout renders in.
    fn format(&self) -> Option<&Format>;

    /// Sets the format.
    fn set_format(&mut self, format: Format);

    /// The wrapped content.
    fn content(&self) -> Option<&str>;

    /// Sets the wrapped content.
    fn set_content(&mut self, content: String);

    /// Renders the content inside the layout.
    fn render(&self) -> Result<String, RenderError>;
}

/// A [`Layout`] rendering `layouts/<name>` through a [`Renderer`].
///
/// The template receives the page as `content` and should emit it with
/// `{{ content|safe }}`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shortstack_core::{Format, Layout, MiniJinjaRenderer, TemplateLayout};
///
/// let mut renderer = MiniJinjaRenderer::new();
/// renderer.add_template("layouts/app.html", "<main>{{ content|safe }}</main>").unwrap();
///
/// let mut layout = TemplateLayout::new(Arc::new(renderer));
/// layout.set_template_name("app".into());
/// layout.set_format(Format::HTML);
/// layout.set_content("<p>hi</p>".into());
/// assert_eq!(layout.render().unwrap(), "<main><p>hi</p></main>");
/// ```
pub struct TemplateLayout {
    renderer: Arc<dyn Renderer>,
    template_name: Option<String>,
    format: Option<Format>,
    content: Option<String>,
}

impl TemplateLayout {
    /// Creates a layout with no template chosen.
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            template_name: None,
            format: None,
            content: None,
        }
    }
}

impl Layout for TemplateLayout {
    fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    fn set_template_name(&mut self, name: String) {
        self.template_name = Some(name);
    }

    fn format(&self) -> Option<&Format> {
        self.format.as_ref()
    }

    fn set_format(&mut self, format: Format) {
        self.format = Some(format);
    }

    fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn set_content(&mut self, content: String) {
        self.content = Some(content);
    }

    fn render(&self) -> Result<String, RenderError> {
        let content = self.content.clone().unwrap_or_default();
        match &self.template_name {
            None => Ok(content),
            Some(name) => self.renderer.render(
                &format!("{LAYOUT_PREFIX}{name}"),
                self.format.as_ref(),
                &json!({ "content": content, "format": self.format }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MiniJinjaRenderer;

    fn renderer() -> Arc<dyn Renderer> {
        let mut renderer = MiniJinjaRenderer::new();
        renderer
            .add_template("layouts/app.html", "[{{ content|safe }}]")
            .unwrap();
        renderer
            .add_template("layouts/app", "({{ content }})")
            .unwrap();
        Arc::new(renderer)
    }

    #[test]
    fn test_passthrough_without_template() {
        let mut layout = TemplateLayout::new(renderer());
        layout.set_content("body".into());
        assert_eq!(layout.render().unwrap(), "body");
    }

    #[test]
    fn test_format_selects_variant() {
        let mut layout = TemplateLayout::new(renderer());
        layout.set_template_name("app".into());
        layout.set_content("body".into());

        assert_eq!(layout.render().unwrap(), "(body)");
        layout.set_format(Format::HTML);
        assert_eq!(layout.render().unwrap(), "[body]");
    }

    #[test]
    fn test_missing_layout_template() {
        let mut layout = TemplateLayout::new(renderer());
        layout.set_template_name("nope".into());
        assert!(matches!(layout.render(), Err(RenderError::NotFound { .. })));
    }
}
