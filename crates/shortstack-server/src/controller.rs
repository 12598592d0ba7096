//! The per-request controller.
//!
//! A [`Controller`] is created for every dispatch and handed to the action
//! handler by mutable reference. It owns the request, the negotiated
//! format, the response status and headers under construction, and the
//! `assigns` vault that carries data from the handler into its views.
//! Nothing in it outlives the dispatch.

use http::header::{HeaderMap, InvalidHeaderValue, CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};

use shortstack_core::{
    Format, HttpError, HttpResult, Layout, MimeTable, ParamMap, Request, ResponseBuilder,
};

use crate::stack::{Scope, StackInner};

/// Request context for one dispatch.
///
/// # Example
///
/// ```
/// use shortstack_core::{Reply, Request};
/// use shortstack_server::StackBuilder;
///
/// let stack = StackBuilder::new()
///     .get("/greet/:name", |c| {
///         let name = c.param("name").unwrap_or("nobody").to_string();
///         c.headers_mut().insert("x-greeted", name.parse()?);
///         Ok(Reply::from(format!("hello {name}")))
///     })
///     .build()
///     .unwrap();
///
/// let response = stack.call(Request::new(http::Method::GET, "/greet/ada")).unwrap();
/// assert_eq!(response.headers()["x-greeted"], "ada");
/// ```
pub struct Controller<'a> {
    stack: &'a StackInner,
    scope: &'a Scope,
    request: Request,
    action: String,
    format: Format,
    status: StatusCode,
    headers: HeaderMap,
    assigns: Map<String, Value>,
}

impl<'a> Controller<'a> {
    pub(crate) fn new(
        stack: &'a StackInner,
        scope: &'a Scope,
        request: Request,
        action: String,
        format: Format,
    ) -> Self {
        Self {
            stack,
            scope,
            request,
            action,
            format,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            assigns: Map::new(),
        }
    }

    /// Sets `Content-Type` from the format and readies the layout.
    ///
    /// A layout with no template picks up the scope's default layout, else
    /// the stack-wide one.
    pub(crate) fn prepare(&mut self) {
        if let Some(content_type) = self.stack.mime.content_type(&self.format) {
            if let Ok(value) = HeaderValue::from_str(content_type) {
                self.headers.insert(CONTENT_TYPE, value);
            }
        }

        let default_layout = self
            .scope
            .default_layout
            .as_deref()
            .or(self.stack.config.default_layout.as_deref());
        let format = self.format.clone();
        if let Some(layout) = self.request.layout_mut() {
            if layout.template_name().is_none() {
                if let Some(name) = default_layout {
                    layout.set_template_name(name.to_string());
                }
            }
            layout.set_format(format);
        }
    }

    pub(crate) fn scope(&self) -> &'a Scope {
        self.scope
    }

    /// Wraps page content in the layout, when one is installed.
    pub(crate) fn wrap(&mut self, content: String) -> HttpResult<String> {
        match self.request.layout_mut() {
            Some(layout) => {
                layout.set_content(content);
                Ok(layout.render()?)
            }
            None => Ok(content),
        }
    }

    /// The inbound request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The inbound request, mutably.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Query, form and path parameters. Path captures win on collision.
    #[must_use]
    pub fn params(&self) -> &ParamMap {
        self.request.params()
    }

    /// A single parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.params().get(name)
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Id of the action being dispatched. Empty when routing failed.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The negotiated format.
    #[must_use]
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// The stack's format table.
    #[must_use]
    pub fn mime(&self) -> &MimeTable {
        &self.stack.mime
    }

    /// Response status so far.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Response headers so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response headers, mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Stores a value for the views.
    pub fn assign<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.assigns.insert(key.into(), value);
        Ok(())
    }

    /// Everything assigned so far.
    #[must_use]
    pub fn assigns(&self) -> &Map<String, Value> {
        &self.assigns
    }

    /// The request's layout, if the pipeline installed one.
    #[must_use]
    pub fn layout(&self) -> Option<&dyn Layout> {
        self.request.layout()
    }

    /// The request's layout, mutably.
    pub fn layout_mut(&mut self) -> Option<&mut (dyn Layout + 'static)> {
        self.request.layout_mut()
    }

    /// Chooses the layout template. Returns `false` when no layout is
    /// installed.
    pub fn set_layout(&mut self, name: impl Into<String>) -> bool {
        match self.request.layout_mut() {
            Some(layout) => {
                layout.set_template_name(name.into());
                true
            }
            None => false,
        }
    }

    /// Renders `name` in the negotiated format.
    ///
    /// Views see every assign plus `params`, `format` and `action`, unless
    /// an assign of the same name shadows them.
    pub fn render(&self, name: &str) -> HttpResult<String> {
        self.render_with(name, &self.view_bindings())
    }

    /// Renders `name` with explicit bindings.
    pub fn render_with(&self, name: &str, bindings: &Value) -> HttpResult<String> {
        Ok(self.scope.renderer.render(name, Some(&self.format), bindings)?)
    }

    fn view_bindings(&self) -> Value {
        let mut bindings = self.assigns.clone();
        let params = serde_json::to_value(self.request.params()).unwrap_or(Value::Null);
        bindings.entry("params").or_insert(params);
        bindings
            .entry("format")
            .or_insert_with(|| Value::String(self.format.to_string()));
        bindings
            .entry("action")
            .or_insert_with(|| Value::String(self.action.clone()));
        Value::Object(bindings)
    }

    /// Builds the path of a named route.
    #[must_use]
    pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.stack.router.url(name, params)
    }

    /// A `302 Found` to `location`, carrying the headers set so far.
    pub fn redirect(&self, location: &str) -> Result<ResponseBuilder, InvalidHeaderValue> {
        let mut headers = self.headers.clone();
        headers.insert(LOCATION, HeaderValue::from_str(location)?);
        Ok(ResponseBuilder::from_parts(StatusCode::FOUND, headers))
    }

    /// A builder seeded with the current status and headers.
    #[must_use]
    pub fn response(&self) -> ResponseBuilder {
        ResponseBuilder::from_parts(self.status, self.headers.clone())
    }

    /// A helper registered on the stack, looked up by type.
    #[must_use]
    pub fn helper<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.scope.helpers.get::<T>()
    }

    /// Renders the built-in `error` view for `error`.
    pub(crate) fn render_error(&self, error: &HttpError) -> HttpResult<String> {
        self.render_with("error", &error.view_bindings())
    }
}

impl std::fmt::Debug for Controller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("action", &self.action)
            .field("format", &self.format)
            .field("status", &self.status)
            .field("path", &self.request.path())
            .finish_non_exhaustive()
    }
}
