//! Test client for in-memory dispatch.

use bytes::Bytes;
use http::Method;
use shortstack_server::{Stack, StackService};

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

#[derive(Debug, Clone)]
enum Target {
    Stack(Stack),
    Service(StackService),
}

/// A test client that dispatches requests in memory.
///
/// Wrap a bare [`Stack`] to exercise dispatch alone, or a
/// [`StackService`] to run the middleware pipeline too.
///
/// # Example
///
/// ```
/// use shortstack_core::Reply;
/// use shortstack_server::StackBuilder;
/// use shortstack_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let stack = StackBuilder::new()
///     .get("/hello", |_c| Ok(Reply::from("hi")))
///     .build()
///     .unwrap();
/// let client = TestClient::new(stack);
///
/// let response = client.get("/hello").header("accept", "*/*").send().await;
/// assert_eq!(response.status_code(), 200);
/// assert_eq!(response.text().unwrap(), "hi");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    target: Target,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// A client dispatching straight into `stack`.
    pub fn new(stack: Stack) -> Self {
        Self {
            target: Target::Stack(stack),
            default_headers: Vec::new(),
        }
    }

    /// A client running requests through `service` and its pipeline.
    pub fn service(service: StackService) -> Self {
        Self {
            target: Target::Service(service),
            default_headers: Vec::new(),
        }
    }

    /// A client running requests through the default pipeline around
    /// `stack`.
    pub fn with_pipeline(stack: Stack) -> Self {
        Self::service(StackService::new(stack))
    }

    /// Sends `name: value` with every request from this client.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a `GET`.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Starts a `POST`.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Starts a `PUT`.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Starts a `DELETE`.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    async fn dispatch(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let request = request.into_request()?;
        let response = match &self.target {
            Target::Stack(stack) => stack.call(request)?,
            Target::Service(service) => service.call(request).await?,
        };
        Ok(TestResponse::from_response(response))
    }
}

/// A request under construction, sent through the client that made it.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Adds a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets `Accept`, which drives format negotiation.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept(accept);
        self
    }

    /// Sets `Content-Type`.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Uses `body` verbatim.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Serializes `value` as a JSON body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Serializes `value` as an urlencoded form body.
    pub fn form<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Dispatches the request.
    ///
    /// # Panics
    ///
    /// Panics if the request is invalid or the dispatch error escapes the
    /// stack. Use [`try_send`](Self::try_send) to inspect those.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }

    /// Dispatches the request, reporting build and dispatch failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.dispatch(request).await
    }
}
