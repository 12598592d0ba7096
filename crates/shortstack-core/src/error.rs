//! Error types for ShortStack.
//!
//! [`HttpError`] is the error taxonomy a dispatch can fail with. Every
//! variant carries an HTTP status, a short name, a human-readable
//! description (safe to show to clients) and a message (diagnostic detail
//! for logs).
//!
//! [`DispatchError`] is what escapes a stack when error interception is
//! turned off: either the typed error or the raw cause, unchanged.

use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Result type alias using [`HttpError`].
pub type HttpResult<T> = Result<T, HttpError>;

/// Client-facing description of a 404.
pub const NOT_FOUND_DESCRIPTION: &str = "The requested resource could not be found.";

/// Client-facing description of a 406.
pub const NOT_ACCEPTABLE_DESCRIPTION: &str =
    "The requested format is not available for this resource.";

/// Client-facing description of a 500.
pub const SERVER_ERROR_DESCRIPTION: &str =
    "The server encountered an unexpected condition and could not complete the request.";

/// An error that maps onto an HTTP response.
///
/// # Example
///
/// ```
/// use shortstack_core::HttpError;
///
/// fn find(id: &str) -> Result<&'static str, HttpError> {
///     match id {
///         "1" => Ok("first"),
///         _ => Err(HttpError::not_found(format!("no record {id}"))),
///     }
/// }
///
/// let err = find("9").unwrap_err();
/// assert_eq!(err.code(), 404);
/// assert_eq!(err.name(), "Not Found");
/// ```
#[derive(Error, Debug)]
pub enum HttpError {
    /// No route, or no visible action.
    #[error("Not Found: {message}")]
    NotFound {
        /// Diagnostic message.
        message: String,
    },

    /// Content negotiation failed.
    #[error("Not Acceptable: {message}")]
    NotAcceptable {
        /// Diagnostic message.
        message: String,
    },

    /// Internal failure.
    #[error("Internal Server Error: {message}")]
    Server {
        /// Diagnostic message.
        message: String,
        /// The underlying error (never exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Any other status.
    #[error("{name}: {message}")]
    Custom {
        /// Response status.
        status: StatusCode,
        /// Short name, such as "Payment Required".
        name: String,
        /// Client-facing description.
        description: String,
        /// Diagnostic message.
        message: String,
    },
}

impl HttpError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a not acceptable error.
    #[must_use]
    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::NotAcceptable {
            message: message.into(),
        }
    }

    /// Creates a server error.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a server error with a source error.
    pub fn server_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Server {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wraps an arbitrary failure as a server error, keeping it as the cause.
    #[must_use]
    pub fn wrap(cause: anyhow::Error) -> Self {
        Self::Server {
            message: cause.to_string(),
            source: Some(cause),
        }
    }

    /// Creates an error with any status code.
    ///
    /// The name defaults to the status's canonical reason.
    #[must_use]
    pub fn custom(status: StatusCode, description: impl Into<String>) -> Self {
        let description = description.into();
        Self::Custom {
            status,
            name: status.canonical_reason().unwrap_or("Error").to_string(),
            message: description.clone(),
            description,
        }
    }

    /// Overrides the short name of a custom error. Other variants keep
    /// their fixed names.
    #[must_use]
    pub fn named(mut self, new_name: impl Into<String>) -> Self {
        if let Self::Custom { name, .. } = &mut self {
            *name = new_name.into();
        }
        self
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Custom { status, .. } => *status,
        }
    }

    /// Returns the numeric status code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Short name of the error.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { .. } => "Not Found",
            Self::NotAcceptable { .. } => "Not Acceptable",
            Self::Server { .. } => "Internal Server Error",
            Self::Custom { name, .. } => name,
        }
    }

    /// Client-facing description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::NotFound { .. } => NOT_FOUND_DESCRIPTION,
            Self::NotAcceptable { .. } => NOT_ACCEPTABLE_DESCRIPTION,
            Self::Server { .. } => SERVER_ERROR_DESCRIPTION,
            Self::Custom { description, .. } => description,
        }
    }

    /// Diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::NotAcceptable { message }
            | Self::Server { message, .. }
            | Self::Custom { message, .. } => message,
        }
    }

    /// The wrapped cause of a server error.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Server { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// Backtrace captured with the cause, if any.
    #[must_use]
    pub fn backtrace(&self) -> Option<String> {
        self.cause().map(|cause| cause.backtrace().to_string())
    }

    /// Values handed to the `error` view.
    ///
    /// Only client-safe fields are included: never the cause or backtrace.
    #[must_use]
    pub fn view_bindings(&self) -> serde_json::Value {
        json!({
            "code": self.code(),
            "name": self.name(),
            "description": self.description(),
        })
    }
}

/// An error that escaped a dispatch because interception is disabled.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A typed HTTP error.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Any other failure, exactly as the handler raised it.
    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl DispatchError {
    /// The status a last-resort handler should answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http(err) => err.status(),
            Self::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts into a typed error, wrapping raw failures as server errors.
    #[must_use]
    pub fn into_http(self) -> HttpError {
        match self {
            Self::Http(err) => err,
            Self::Unhandled(cause) => HttpError::wrap(cause),
        }
    }
}
