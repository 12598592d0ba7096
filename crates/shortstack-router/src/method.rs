//! Method filters for routes.

use std::fmt;

use http::Method;

/// The HTTP method a route answers to.
///
/// `Any` matches every request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// Every method.
    Any,
}

impl RouteMethod {
    /// Whether a request with `method` is accepted.
    #[must_use]
    pub fn matches(self, method: &Method) -> bool {
        match self {
            Self::Get => *method == Method::GET,
            Self::Post => *method == Method::POST,
            Self::Put => *method == Method::PUT,
            Self::Delete => *method == Method::DELETE,
            Self::Any => true,
        }
    }

    /// Lowercase name, used when deriving action identifiers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_methods() {
        assert!(RouteMethod::Get.matches(&Method::GET));
        assert!(!RouteMethod::Get.matches(&Method::POST));
        assert!(RouteMethod::Delete.matches(&Method::DELETE));
    }

    #[test]
    fn test_any_matches_everything() {
        for method in [Method::GET, Method::PATCH, Method::OPTIONS, Method::PUT] {
            assert!(RouteMethod::Any.matches(&method));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RouteMethod::Post.to_string(), "post");
    }
}
