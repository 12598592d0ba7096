//! Route pattern errors.

use thiserror::Error;

/// Errors raised while compiling a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// An optional group was opened but never closed, or closed without
    /// being opened.
    #[error("unbalanced parentheses in route pattern `{pattern}`")]
    UnbalancedGroup {
        /// The offending pattern.
        pattern: String,
    },

    /// A glob capture appeared before the last segment.
    #[error("glob `*{name}` must be the last segment of `{pattern}`")]
    GlobNotLast {
        /// The offending pattern.
        pattern: String,
        /// Name of the glob capture.
        name: String,
    },

    /// A capture had no name (`/:` or `/{}`).
    #[error("empty capture name in route pattern `{pattern}`")]
    EmptyCapture {
        /// The offending pattern.
        pattern: String,
    },
}
