//! Stacks and their builder.
//!
//! A stack is configured once through [`StackBuilder`] and frozen into a
//! [`Stack`]: an immutable, cheaply cloneable handle that dispatches
//! requests.
//!
//! Internally a stack is a list of scopes. The root scope holds the
//! stack's own actions; every mounted stack contributes its scopes after
//! it, pointing back at the scope it was mounted into. At build time each
//! scope inherits format declarations, the exception handler, helpers,
//! the default layout and the renderer from its parent unless it set its
//! own.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use shortstack_config::{DispatchConfig, ShortStackConfig};
use shortstack_core::{
    ActionResult, DispatchError, Format, HttpError, MimeTable, MiniJinjaRenderer, Renderer, Reply,
    Request, Response,
};
use shortstack_router::{RouteError, RouteMethod, Router};

use crate::controller::Controller;
use crate::dispatcher;
use crate::error::SetupError;
use crate::helpers::Helpers;
use crate::registry::{Action, ActionHandler, ActionRegistry, ExceptionHandler};

/// Where a route leads: an action in one of the stack's scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Scope index; `0` is the stack's own.
    pub scope: usize,
    /// Action id within the scope.
    pub action: String,
}

/// Per-route options.
///
/// # Example
///
/// ```
/// use shortstack_server::RouteOptions;
///
/// let options = RouteOptions::name("post").with_action("show_post");
/// assert_eq!(options.route_name(), Some("post"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    name: Option<String>,
    action: Option<String>,
}

impl RouteOptions {
    /// No name, derived action id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options naming the route for URL generation.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new().with_name(name)
    }

    /// Options with an explicit action id.
    #[must_use]
    pub fn action(id: impl Into<String>) -> Self {
        Self::new().with_action(id)
    }

    /// Sets the route name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the action id.
    #[must_use]
    pub fn with_action(mut self, id: impl Into<String>) -> Self {
        self.action = Some(id.into());
        self
    }

    /// The route name, if any.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The explicit action id, if any.
    #[must_use]
    pub fn action_id(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

/// The action id derived for a route: the lowercase method, `_`, then the
/// path with every non-word character replaced by `_`.
///
/// ```
/// use shortstack_router::RouteMethod;
/// use shortstack_server::stack::derive_action_id;
///
/// assert_eq!(derive_action_id(RouteMethod::Get, "/posts/:id"), "get__posts__id");
/// assert_eq!(derive_action_id(RouteMethod::Any, "/"), "any__");
/// ```
#[must_use]
pub fn derive_action_id(method: RouteMethod, path: &str) -> String {
    let sanitized: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}_{sanitized}", method.as_str().to_ascii_lowercase())
}

/// Settings a scope was given directly, as opposed to inherited ones.
#[derive(Clone, Default)]
struct ScopeSettings {
    exception_handler: Option<ExceptionHandler>,
    helpers: Helpers,
    default_layout: Option<String>,
    renderer: Option<Arc<dyn Renderer>>,
}

/// One stack's share of a composed stack.
///
/// `own` holds what the builder set on this scope. The other fields are
/// recomputed from `own` and the parent chain on every build, so changes
/// made after [`StackBuilder::inherit`] reach mounted scopes too.
#[derive(Clone)]
pub(crate) struct Scope {
    pub(crate) registry: ActionRegistry,
    pub(crate) parent: Option<usize>,
    own: ScopeSettings,
    /// Resolved scope formats; filled at build.
    pub(crate) formats: Vec<Format>,
    pub(crate) exception_handler: Option<ExceptionHandler>,
    pub(crate) helpers: Helpers,
    pub(crate) default_layout: Option<String>,
    pub(crate) renderer: Arc<dyn Renderer>,
}

impl Scope {
    fn root() -> Self {
        Self {
            registry: ActionRegistry::new(),
            parent: None,
            own: ScopeSettings::default(),
            formats: Vec::new(),
            exception_handler: None,
            helpers: Helpers::new(),
            default_layout: None,
            renderer: Arc::new(MiniJinjaRenderer::new()),
        }
    }

    fn resolve(&mut self, parent: Option<&Self>) {
        let own_formats = self.registry.default_formats();
        self.formats = match parent {
            Some(parent) if own_formats.is_empty() => parent.formats.clone(),
            _ => own_formats.to_vec(),
        };

        self.exception_handler.clone_from(&self.own.exception_handler);
        self.helpers = self.own.helpers.clone();
        self.default_layout.clone_from(&self.own.default_layout);
        if let Some(renderer) = &self.own.renderer {
            self.renderer = Arc::clone(renderer);
        }

        let Some(parent) = parent else {
            return;
        };
        if self.exception_handler.is_none() {
            self.exception_handler.clone_from(&parent.exception_handler);
        }
        self.helpers.extend_missing(&parent.helpers);
        if self.default_layout.is_none() {
            self.default_layout.clone_from(&parent.default_layout);
        }
        if self.own.renderer.is_none() {
            self.renderer = Arc::clone(&parent.renderer);
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("registry", &self.registry)
            .field("parent", &self.parent)
            .field("formats", &self.formats)
            .field("custom_handler", &self.exception_handler.is_some())
            .field("default_layout", &self.default_layout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) struct StackInner {
    pub(crate) router: Router<Target>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) config: DispatchConfig,
    pub(crate) mime: MimeTable,
    pub(crate) default_format: Format,
}

impl StackInner {
    pub(crate) fn scope(&self, index: usize) -> &Scope {
        &self.scopes[index]
    }

    /// The formats `action` may answer with, in preference order.
    ///
    /// The action's own declaration wins, then its scope's. With neither,
    /// every known format is allowed, the default format first.
    pub(crate) fn declared_formats(&self, scope: &Scope, action: &Action) -> Vec<Format> {
        if !action.formats().is_empty() {
            return action.formats().to_vec();
        }
        if !scope.formats.is_empty() {
            return scope.formats.clone();
        }
        let mut formats = Vec::with_capacity(8);
        formats.push(self.default_format.clone());
        formats.extend(
            self.mime
                .formats()
                .filter(|format| **format != self.default_format)
                .cloned(),
        );
        formats
    }
}

/// Configures a [`Stack`].
///
/// Every method consumes and returns the builder. Route-defining calls
/// record the first pattern error, which [`build`](Self::build) reports.
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use shortstack_core::{Format, Reply, Request};
/// use shortstack_server::{RouteOptions, StackBuilder};
///
/// let stack = StackBuilder::new()
///     .provides(vec![Format::JSON, Format::TEXT])
///     .get("/", |_c| Ok(Reply::from("home")))
///     .route_with(
///         shortstack_router::RouteMethod::Get,
///         "/posts/:id(.:format)",
///         RouteOptions::name("post"),
///         |c| Ok(Reply::from(format!("post {} as {}", c.param("id").unwrap_or(""), c.format()))),
///     )
///     .build()
///     .unwrap();
///
/// let response = stack.call(Request::new(Method::GET, "/posts/3.text")).unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(stack.url("post", &[("id", "3")]).as_deref(), Some("/posts/3"));
/// ```
pub struct StackBuilder {
    router: Router<Target>,
    scopes: Vec<Scope>,
    config: DispatchConfig,
    mime: MimeTable,
    default_format: Format,
    error: Option<RouteError>,
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StackBuilder {
    /// An empty stack with default dispatch settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            scopes: vec![Scope::root()],
            config: DispatchConfig::default(),
            mime: MimeTable::default(),
            default_format: Format::HTML,
            error: None,
        }
    }

    /// A builder starting from a copy of `parent`: its routes, actions,
    /// formats, helpers, exception handler, renderer and settings.
    #[must_use]
    pub fn inherit(parent: &Stack) -> Self {
        let inner = &parent.inner;
        Self {
            router: inner.router.clone(),
            scopes: inner.scopes.clone(),
            config: inner.config.clone(),
            mime: inner.mime.clone(),
            default_format: inner.default_format.clone(),
            error: None,
        }
    }

    fn root_mut(&mut self) -> &mut Scope {
        &mut self.scopes[0]
    }

    fn record(&mut self, error: RouteError) {
        tracing::warn!(error = %error, "invalid route");
        self.error.get_or_insert(error);
    }

    /// Routes `GET path` to `handler`.
    #[must_use]
    pub fn get<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        self.route_with(RouteMethod::Get, path, RouteOptions::new(), handler)
    }

    /// Routes `POST path` to `handler`.
    #[must_use]
    pub fn post<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        self.route_with(RouteMethod::Post, path, RouteOptions::new(), handler)
    }

    /// Routes `PUT path` to `handler`.
    #[must_use]
    pub fn put<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        self.route_with(RouteMethod::Put, path, RouteOptions::new(), handler)
    }

    /// Routes `DELETE path` to `handler`.
    #[must_use]
    pub fn delete<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        self.route_with(RouteMethod::Delete, path, RouteOptions::new(), handler)
    }

    /// Routes every method on `path` to `handler`.
    #[must_use]
    pub fn any<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        self.route_with(RouteMethod::Any, path, RouteOptions::new(), handler)
    }

    /// Defines and publishes an action, then routes to it.
    ///
    /// The action id comes from the options, else [`derive_action_id`].
    #[must_use]
    pub fn route_with<F>(
        mut self,
        method: RouteMethod,
        path: &str,
        options: RouteOptions,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        let RouteOptions { name, action } = options;
        let id = action.unwrap_or_else(|| derive_action_id(method, path));
        let handler: ActionHandler = Arc::new(handler);
        self.root_mut().registry.define_published(id.clone(), handler);

        let target = Target { scope: 0, action: id };
        if let Err(err) = self.router.insert_named(method, path, target, name) {
            self.record(err);
        }
        self
    }

    /// Defines an action without routing or publishing it.
    #[must_use]
    pub fn action<F>(mut self, id: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
    {
        let handler: ActionHandler = Arc::new(handler);
        self.root_mut().registry.define(id, handler);
        self
    }

    /// Adds `id` to the dispatch allow-list.
    #[must_use]
    pub fn publish(mut self, id: &str) -> Self {
        self.root_mut().registry.publish(id);
        self
    }

    /// Sets the formats captured by actions defined from now on.
    #[must_use]
    pub fn provides(mut self, formats: Vec<Format>) -> Self {
        self.root_mut().registry.provides(None, formats);
        self
    }

    /// Replaces the formats of one already defined action.
    #[must_use]
    pub fn provides_for(mut self, id: &str, formats: Vec<Format>) -> Self {
        self.root_mut().registry.provides(Some(id), formats);
        self
    }

    /// Installs the stack's exception handler, replacing any earlier one.
    ///
    /// The handler runs with the status already set from the error.
    #[must_use]
    pub fn handle_exception<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>, &HttpError) -> Reply + Send + Sync + 'static,
    {
        self.root_mut().own.exception_handler = Some(Arc::new(handler));
        self
    }

    /// Drops the custom exception handler; errors render the `error` view
    /// again.
    #[must_use]
    pub fn clear_exception_handler(mut self) -> Self {
        self.root_mut().own.exception_handler = None;
        self
    }

    /// Registers a helper value, available to handlers by type.
    #[must_use]
    pub fn helper<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.root_mut().own.helpers.insert(value);
        self
    }

    /// Renders views and layouts through `renderer`.
    #[must_use]
    pub fn renderer(self, renderer: impl Renderer + 'static) -> Self {
        self.shared_renderer(Arc::new(renderer))
    }

    /// Renders through an already shared renderer.
    #[must_use]
    pub fn shared_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.root_mut().own.renderer = Some(renderer);
        self
    }

    /// Adds a format to the stack's table, or replaces a known one.
    #[must_use]
    pub fn register_format(
        mut self,
        format: Format,
        extensions: &[&str],
        media_types: &[&str],
    ) -> Self {
        self.mime.register(format, extensions, media_types);
        self
    }

    /// The format used when nothing else decides: error pages raised
    /// before negotiation, and first choice for actions declaring none.
    #[must_use]
    pub fn default_format(mut self, format: Format) -> Self {
        self.default_format = format;
        self
    }

    /// Layout template applied when a handler picks none.
    #[must_use]
    pub fn default_layout(mut self, name: impl Into<String>) -> Self {
        self.root_mut().own.default_layout = Some(name.into());
        self
    }

    /// Replaces the dispatch settings.
    #[must_use]
    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Applies a loaded configuration: dispatch settings, the default
    /// format and a renderer over the configured view roots.
    ///
    /// Roots that do not exist are skipped.
    pub fn configure(mut self, config: &ShortStackConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let roots: Vec<&Path> = config
            .views
            .paths
            .iter()
            .map(Path::new)
            .filter(|root| {
                let exists = root.is_dir();
                if !exists {
                    tracing::debug!(root = %root.display(), "view root missing, skipped");
                }
                exists
            })
            .collect();
        let renderer = MiniJinjaRenderer::from_roots(&roots)?;

        if let Some(format) = self.mime.resolve(&config.views.default_format) {
            self.default_format = format.clone();
        }
        self.config = config.dispatch.clone();
        Ok(self.renderer(renderer))
    }

    /// Serves every route of `child` under `prefix`.
    ///
    /// The child keeps its own actions and settings, and inherits from this
    /// stack whatever it did not set.
    #[must_use]
    pub fn mount(mut self, prefix: &str, child: &Stack) -> Self {
        let inner = &child.inner;
        let offset = self.scopes.len();

        for scope in &inner.scopes {
            let mut scope = scope.clone();
            scope.parent = Some(scope.parent.map_or(0, |parent| parent + offset));
            self.scopes.push(scope);
        }

        let mounted = self.router.mount(prefix, &inner.router, |target| Target {
            scope: target.scope + offset,
            action: target.action.clone(),
        });
        if let Err(err) = mounted {
            self.record(err);
        }

        for format in inner.mime.formats() {
            if self.mime.get(format).is_some() {
                continue;
            }
            if let Some(row) = inner.mime.get(format) {
                let extensions: Vec<&str> = row.extensions().iter().map(String::as_str).collect();
                let media_types: Vec<&str> =
                    row.media_types().iter().map(String::as_str).collect();
                self.mime.register(format.clone(), &extensions, &media_types);
            }
        }
        self
    }

    /// Freezes the configuration.
    pub fn build(self) -> Result<Stack, RouteError> {
        let Self {
            router,
            mut scopes,
            config,
            mime,
            default_format,
            error,
        } = self;
        if let Some(err) = error {
            return Err(err);
        }

        // Parents always precede their children.
        for index in 0..scopes.len() {
            let (resolved, rest) = scopes.split_at_mut(index);
            let scope = &mut rest[0];
            let parent = scope.parent.and_then(|parent| resolved.get(parent));
            scope.resolve(parent);
        }

        tracing::debug!(
            routes = router.len(),
            scopes = scopes.len(),
            handle_errors = config.handle_errors,
            "stack built"
        );
        Ok(Stack {
            inner: Arc::new(StackInner {
                router,
                scopes,
                config,
                mime,
                default_format,
            }),
        })
    }
}

impl fmt::Debug for StackBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuilder")
            .field("routes", &self.router.len())
            .field("scopes", &self.scopes.len())
            .field("config", &self.config)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// A frozen stack.
///
/// Cloning is cheap; clones share the same routes and actions. Every call
/// gets a fresh [`Controller`], so concurrent dispatches share nothing
/// mutable.
#[derive(Debug, Clone)]
pub struct Stack {
    inner: Arc<StackInner>,
}

impl Stack {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> StackBuilder {
        StackBuilder::new()
    }

    /// Routes and dispatches `request`.
    ///
    /// `Err` only when error interception is off and the dispatch failed.
    pub fn call(&self, request: Request) -> Result<Response, DispatchError> {
        dispatcher::dispatch(&self.inner, request)
    }

    /// Dispatches straight to a root action, without routing.
    ///
    /// The format comes from the `format` param or `Accept`.
    pub fn dispatch_action(&self, action: &str, request: Request) -> Result<Response, DispatchError> {
        dispatcher::dispatch_action(&self.inner, action, request)
    }

    /// Builds the path of a named route.
    #[must_use]
    pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.inner.router.url(name, params)
    }

    /// Whether a root action is published and defined.
    #[must_use]
    pub fn visible(&self, action: &str) -> bool {
        self.inner.scope(0).registry.visible(action)
    }

    /// The route table.
    #[must_use]
    pub fn router(&self) -> &Router<Target> {
        &self.inner.router
    }

    /// Dispatch settings.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    /// The format table.
    #[must_use]
    pub fn mime(&self) -> &MimeTable {
        &self.inner.mime
    }

    /// The root renderer.
    #[must_use]
    pub fn renderer(&self) -> Arc<dyn Renderer> {
        Arc::clone(&self.inner.scope(0).renderer)
    }
}
