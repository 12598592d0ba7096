//! Outbound responses.
//!
//! A [`Response`] is the uniform (status, headers, body) triple every
//! dispatch produces. [`ResponseBuilder`] is the mutable, unfinished form a
//! handler can assemble and return; finishing it applies the HTTP rules for
//! bodiless statuses and `Content-Length`.

use std::fmt;

use bytes::{Bytes, BytesMut};
use http::header::{IntoHeaderName, InvalidHeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;

/// A response body.
pub enum Body {
    /// No body.
    Empty,
    /// A single buffer.
    Full(Bytes),
    /// Buffered chunks, sent in order.
    Chunks(Vec<Bytes>),
    /// A chunk producer, drained when the response is converted.
    Stream(Box<dyn Iterator<Item = Bytes> + Send>),
}

impl Body {
    /// Length in bytes, when known without draining a stream.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Empty => Some(0),
            Self::Full(bytes) => Some(bytes.len()),
            Self::Chunks(chunks) => Some(chunks.iter().map(Bytes::len).sum()),
            Self::Stream(_) => None,
        }
    }

    /// Whether the body is known to be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Collects the body into one buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Full(bytes) => bytes,
            Self::Chunks(chunks) => concat(chunks),
            Self::Stream(stream) => concat(stream),
        }
    }
}

fn concat(chunks: impl IntoIterator<Item = Bytes>) -> Bytes {
    let mut buf = BytesMut::new();
    for chunk in chunks {
        buf.extend_from_slice(&chunk);
    }
    buf.freeze()
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Full(bytes) => f.debug_tuple("Body::Full").field(bytes).finish(),
            Self::Chunks(chunks) => f.debug_tuple("Body::Chunks").field(chunks).finish(),
            Self::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Empty
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Full(Bytes::from(text))
        }
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Full(Bytes::from_static(text.as_bytes()))
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(Bytes::from(bytes))
    }
}

/// A complete response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Creates a response from its parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// A `text/plain` response.
    #[must_use]
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Self::new(status, headers, text.into())
    }

    /// Response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Splits into parts.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }

    /// Converts into an `http` response with a buffered body.
    #[must_use]
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body.into_bytes()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// An unfinished response a handler can build up and return.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use shortstack_core::ResponseBuilder;
///
/// let response = ResponseBuilder::new()
///     .status(StatusCode::CREATED)
///     .write("hello ")
///     .write("world")
///     .finish();
///
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.headers()["content-length"], "11");
/// ```
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    chunks: Vec<Bytes>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// A `200 OK` with no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            chunks: Vec::new(),
        }
    }

    /// Starts from an existing status and header set.
    #[must_use]
    pub fn from_parts(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            chunks: Vec::new(),
        }
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: &str) -> Result<Self, InvalidHeaderValue> {
        let mut builder = Self::new().status(StatusCode::FOUND);
        builder
            .headers
            .insert(LOCATION, HeaderValue::from_str(location)?);
        Ok(builder)
    }

    /// Sets the status.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing earlier values.
    #[must_use]
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a body chunk.
    #[must_use]
    pub fn write(mut self, chunk: impl Into<Bytes>) -> Self {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        self
    }

    /// The current status.
    #[must_use]
    pub fn current_status(&self) -> StatusCode {
        self.status
    }

    /// The current headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Finalizes the response.
    ///
    /// `204` and `304` lose their body and entity headers. Everything else
    /// gets a `Content-Length` unless one was set explicitly.
    #[must_use]
    pub fn finish(self) -> Response {
        let Self {
            status,
            mut headers,
            mut chunks,
        } = self;

        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
            headers.remove(CONTENT_TYPE);
            headers.remove(CONTENT_LENGTH);
            return Response::new(status, headers, Body::Empty);
        }

        let length: usize = chunks.iter().map(Bytes::len).sum();
        if !headers.contains_key(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }

        let body = match chunks.len() {
            0 => Body::Empty,
            1 => chunks.pop().map_or(Body::Empty, Body::Full),
            _ => Body::Chunks(chunks),
        };
        Response::new(status, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_sets_content_length() {
        let response = ResponseBuilder::new().write("abc").finish();
        assert_eq!(response.headers()[CONTENT_LENGTH], "3");
        assert_eq!(response.into_http().status(), StatusCode::OK);
    }

    #[test]
    fn test_finish_keeps_explicit_content_length() {
        let response = ResponseBuilder::new()
            .header(CONTENT_LENGTH, HeaderValue::from_static("99"))
            .write("abc")
            .finish();
        assert_eq!(response.headers()[CONTENT_LENGTH], "99");
    }

    #[test]
    fn test_no_content_strips_body() {
        let response = ResponseBuilder::new()
            .status(StatusCode::NO_CONTENT)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .write("ignored")
            .finish();
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(response.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_multiple_chunks() {
        let response = ResponseBuilder::new().write("a").write("b").finish();
        assert!(matches!(response.body(), Body::Chunks(c) if c.len() == 2));
        assert_eq!(response.into_parts().2.into_bytes(), Bytes::from_static(b"ab"));
    }

    #[test]
    fn test_redirect() {
        let response = ResponseBuilder::redirect("/somewhere").unwrap().finish();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/somewhere");
        assert!(ResponseBuilder::redirect("bad\nvalue").is_err());
    }

    #[test]
    fn test_stream_body_drains() {
        let chunks = vec![Bytes::from_static(b"x"), Bytes::from_static(b"y")];
        let body = Body::Stream(Box::new(chunks.into_iter()));
        assert_eq!(body.len(), None);
        assert_eq!(body.into_bytes(), Bytes::from_static(b"xy"));
    }
}
