//! Route table for ShortStack.
//!
//! Routes map an HTTP method and a path pattern to a target (for a stack,
//! an action identifier). Patterns support:
//!
//! - **Literal segments**: `/posts/featured`
//! - **Named captures**: `/posts/:id` or `/posts/{id}`
//! - **Trailing globs**: `/files/*path`
//! - **Optional groups**, nested: `/posts(/:year(/:month))`
//! - **Format suffix**: `/posts/:id(.:format)`, reported as a hint rather
//!   than a capture
//!
//! When several routes match, the one with more literal segments wins, and
//! among equally specific routes the first registered wins.
//!
//! # Example
//!
//! ```rust
//! use shortstack_router::{RouteMethod, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(RouteMethod::Get, "/posts/:id", "show").unwrap();
//! router.insert(RouteMethod::Get, "/posts/featured", "featured").unwrap();
//! router.insert(RouteMethod::Any, "/files/*path", "files").unwrap();
//!
//! let matched = router.match_route(&Method::GET, "/posts/123").unwrap();
//! assert_eq!(*matched.target, "show");
//! assert_eq!(matched.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! Every optional-group combination of a pattern is inserted into a radix
//! tree as its own entry:
//!
//! ```text
//!                    (root)
//!                      │
//!                   "posts"  ── entry: /posts
//!              ┌───────┴───────┐
//!         "featured"         ":year"  ── entry: /posts/:year
//!          (entry)              │
//!                            ":month" ── entry: /posts/:year/:month
//! ```
//!
//! Lookup collects every entry the path reaches and ranks them.

mod error;
mod method;
mod node;
mod params;
mod pattern;
mod router;

pub use error::RouteError;
pub use method::RouteMethod;
pub use params::Params;
pub use pattern::{Pattern, Segment, Variant};
pub use router::{Route, Router};

/// A matched route with its captures and format hint.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a, T> {
    /// The matched route's target
    pub target: &'a T,
    /// The matched route
    pub route: &'a Route<T>,
    /// Captured path parameters
    pub params: Params,
    /// Extension stripped by a `(.:format)` suffix, if any
    pub format: Option<String>,
}
