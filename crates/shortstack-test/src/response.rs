//! Buffered responses for assertions.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use shortstack_core::Response;

use crate::error::TestError;

/// A dispatched response with helpers for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers a stack response.
    #[must_use]
    pub fn from_response(response: Response) -> Self {
        let (status, headers, body) = response.into_parts();
        Self {
            status,
            headers,
            body: body.into_bytes(),
        }
    }

    /// Creates a test response from raw parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Numeric status.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// One header.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// One header, if it is visible ASCII.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// `Content-Type`, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the `Location` of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header_str(header::LOCATION.as_str())
    }

    /// Body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Body parsed as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body parsed as untyped JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Checks the status.
    ///
    /// # Panics
    ///
    /// Panics on a different status.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "expected status {expected}, got {}",
            self.status
        );
        self
    }

    /// Checks one header's value.
    ///
    /// # Panics
    ///
    /// Panics when the header is missing or differs.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        match self.header_str(name) {
            Some(actual) => assert_eq!(
                actual, expected,
                "header '{name}': expected '{expected}', got '{actual}'"
            ),
            None => panic!("header '{name}' missing"),
        }
        self
    }

    /// Asserts the body equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body differs or is not UTF-8.
    pub fn assert_body(&self, expected: impl AsRef<str>) -> &Self {
        let actual = String::from_utf8_lossy(&self.body);
        assert_eq!(actual, expected.as_ref(), "unexpected body");
        self
    }

    /// Asserts the body contains `needle`.
    ///
    /// # Panics
    ///
    /// Panics if the body does not contain it.
    pub fn assert_body_contains(&self, needle: impl AsRef<str>) -> &Self {
        let needle = needle.as_ref();
        let actual = String::from_utf8_lossy(&self.body);
        assert!(
            actual.contains(needle),
            "body does not contain '{needle}': '{actual}'"
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}
