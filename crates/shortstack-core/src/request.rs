//! Inbound requests and their parameters.

use std::fmt;

use bytes::Bytes;
use http::header::{IntoHeaderName, CONTENT_TYPE};
use http::{Extensions, HeaderMap, HeaderValue, Method};
use indexmap::IndexMap;
use serde::Serialize;

use crate::layout::Layout;
use crate::request_id::RequestId;

/// A parameter value: a single string, or a list for `name[]` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// One value.
    Single(String),
    /// Several values, in arrival order.
    Multi(Vec<String>),
}

impl ParamValue {
    /// The value, or the first of several.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// Every value.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Request parameters merged from the query string, a form body and path
/// captures.
///
/// Plain keys keep their last value; `name[]` keys collect every value under
/// `name`.
///
/// # Example
///
/// ```
/// use shortstack_core::ParamMap;
///
/// let params = ParamMap::parse_urlencoded("a=1&tags[]=x&tags[]=y&a=2");
/// assert_eq!(params.get("a"), Some("2"));
/// assert_eq!(params.get_all("tags"), vec!["x", "y"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamMap(IndexMap<String, ParamValue>);

impl ParamMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` data.
    ///
    /// Malformed input yields an empty map.
    #[must_use]
    pub fn parse_urlencoded(input: &str) -> Self {
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(input) {
            Ok(pairs) => pairs,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring malformed urlencoded data");
                Vec::new()
            }
        };

        let mut params = Self::new();
        for (key, value) in pairs {
            match key.strip_suffix("[]") {
                Some(name) => params.append(name, value),
                None => params.insert(key, value),
            }
        }
        params
    }

    /// Sets `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Adds a value to the list under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.0.entry(name.into()) {
            indexmap::map::Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                if let ParamValue::Single(first) = current {
                    let first = std::mem::take(first);
                    *current = ParamValue::Multi(vec![first]);
                }
                if let ParamValue::Multi(values) = current {
                    values.push(value);
                }
            }
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(ParamValue::Multi(vec![value]));
            }
        }
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(&mut self, other: Self) {
        for (name, value) in other.0 {
            self.0.insert(name, value);
        }
    }

    /// The value of `name`, or the first of several.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(ParamValue::as_str)
    }

    /// The raw value of `name`.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Every value of `name`.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0.get(name).map(ParamValue::values).unwrap_or_default()
    }

    /// Whether `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Removes `name`.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.shift_remove(name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An inbound request as seen by a stack.
///
/// Built from an [`http::Request`] by [`Request::from_http`], or directly
/// with [`Request::new`] in tests. The optional [`Layout`] is installed by
/// the layout middleware stage.
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: ParamMap,
    request_id: RequestId,
    layout: Option<Box<dyn Layout>>,
    extensions: Extensions,
}

impl Request {
    /// Creates a request for `uri`, which may carry a query string.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (uri, None),
        };
        let params = query
            .as_deref()
            .map(ParamMap::parse_urlencoded)
            .unwrap_or_default();

        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params,
            request_id: RequestId::new(),
            layout: None,
            extensions: Extensions::new(),
        }
    }

    /// Converts an `http` request whose body has been collected.
    ///
    /// Form bodies (`application/x-www-form-urlencoded`) are merged into the
    /// params over the query values.
    #[must_use]
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

        let mut req = Self::new(parts.method, &uri);
        req.headers = parts.headers;
        req.extensions = parts.extensions;
        req.set_body(body);
        req
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body, parsing it as form data when the content type says so.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.set_body(body.into());
        self
    }

    /// Installs a layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Box<dyn Layout>) -> Self {
        self.layout = Some(layout);
        self
    }

    fn set_body(&mut self, body: Bytes) {
        let is_form = self
            .header(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            if let Ok(text) = std::str::from_utf8(&body) {
                self.params.merge(ParamMap::parse_urlencoded(text));
            }
        }
        self.body = body;
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// A header value as a string, when it is valid visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a header joined with `, `, the way a list header
    /// sent on several lines reads when folded onto one.
    ///
    /// Values that are not visible ASCII are skipped.
    #[must_use]
    pub fn header_list(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        (!values.is_empty()).then(|| values.join(", "))
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Query and form parameters.
    #[must_use]
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Mutable parameters.
    pub fn params_mut(&mut self) -> &mut ParamMap {
        &mut self.params
    }

    /// The request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request id.
    pub fn set_request_id(&mut self, id: RequestId) {
        self.request_id = id;
    }

    /// The installed layout.
    #[must_use]
    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    /// The installed layout, mutably.
    pub fn layout_mut(&mut self) -> Option<&mut (dyn Layout + 'static)> {
        self.layout.as_deref_mut()
    }

    /// Installs a layout.
    pub fn set_layout(&mut self, layout: Box<dyn Layout>) {
        self.layout = Some(layout);
    }

    /// Removes and returns the layout.
    pub fn take_layout(&mut self) -> Option<Box<dyn Layout>> {
        self.layout.take()
    }

    /// Typed extensions carried alongside the request.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("request_id", &self.request_id)
            .field("params", &self.params)
            .field("has_layout", &self.layout.is_some())
            .finish_non_exhaustive()
    }
}
