//! High-level router API.
//!
//! This module provides the main [`Router`] struct which is the primary
//! interface for registering, mounting and matching routes.

use http::Method;

use crate::error::RouteError;
use crate::method::RouteMethod;
use crate::node::Node;
use crate::params::Params;
use crate::pattern::Pattern;
use crate::RouteMatch;

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route<T> {
    method: RouteMethod,
    pattern: Pattern,
    target: T,
    name: Option<String>,
}

impl<T> Route<T> {
    /// The method filter.
    #[must_use]
    pub fn method(&self) -> RouteMethod {
        self.method
    }

    /// The compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// What the route dispatches to.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The route name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// One expanded variant of a route, as stored in the tree.
#[derive(Debug, Clone, Copy)]
struct Entry {
    route: usize,
    literals: usize,
}

struct Candidate {
    route: usize,
    literals: usize,
    params: Params,
    format: Option<String>,
}

/// A route table backed by a radix tree.
///
/// Routes are immutable once registered. When several routes match a path,
/// the one with more literal segments wins; among equally specific routes
/// the first registered wins.
///
/// # Example
///
/// ```rust
/// use shortstack_router::{RouteMethod, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(RouteMethod::Get, "/posts/:id(.:format)", "show").unwrap();
/// router.insert(RouteMethod::Get, "/posts/featured", "featured").unwrap();
///
/// let matched = router.match_route(&Method::GET, "/posts/featured").unwrap();
/// assert_eq!(*matched.target, "featured");
///
/// let matched = router.match_route(&Method::GET, "/posts/7.json").unwrap();
/// assert_eq!(*matched.target, "show");
/// assert_eq!(matched.params.get("id"), Some("7"));
/// assert_eq!(matched.format.as_deref(), Some("json"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    /// Root node of the radix tree
    root: Node,
    /// Routes in registration order
    routes: Vec<Route<T>>,
    /// Expanded variants, indexed by the tree's leaf entries
    entries: Vec<Entry>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            routes: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Registers a route and returns its index.
    pub fn insert(
        &mut self,
        method: RouteMethod,
        pattern: &str,
        target: T,
    ) -> Result<usize, RouteError> {
        self.insert_named(method, pattern, target, None)
    }

    /// Registers a route with an optional name for URL generation.
    pub fn insert_named(
        &mut self,
        method: RouteMethod,
        pattern: &str,
        target: T,
        name: Option<String>,
    ) -> Result<usize, RouteError> {
        let pattern = Pattern::parse(pattern)?;
        Ok(self.insert_pattern(method, pattern, target, name))
    }

    fn insert_pattern(
        &mut self,
        method: RouteMethod,
        pattern: Pattern,
        target: T,
        name: Option<String>,
    ) -> usize {
        let route = self.routes.len();
        for variant in pattern.variants() {
            let entry = self.entries.len();
            self.entries.push(Entry {
                route,
                literals: variant.literal_count(),
            });
            self.root.insert(variant.segments(), entry);
        }
        self.routes.push(Route {
            method,
            pattern,
            target,
            name,
        });
        route
    }

    /// Copies every route of `other` under `prefix`, in order.
    ///
    /// `map` converts the child's targets into this router's target type.
    pub fn mount<U>(
        &mut self,
        prefix: &str,
        other: &Router<U>,
        mut map: impl FnMut(&U) -> T,
    ) -> Result<(), RouteError> {
        Pattern::parse(prefix)?;
        let prefixed = other
            .routes
            .iter()
            .map(|route| route.pattern.prefixed(prefix))
            .collect::<Result<Vec<_>, _>>()?;

        for (route, pattern) in other.routes.iter().zip(prefixed) {
            self.insert_pattern(route.method, pattern, map(&route.target), route.name.clone());
        }
        Ok(())
    }

    /// Matches a request against the table.
    ///
    /// When the last segment carries an extension, routes declaring a
    /// `(.:format)` suffix are also tried against the stripped path; the
    /// extension is then reported as [`RouteMatch::format`].
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut best = None;
        self.consider(&segments, method, None, &mut best);

        if let Some((stem, ext)) = segments.last().and_then(|last| split_extension(last)) {
            let mut stripped = segments.clone();
            if let Some(last) = stripped.last_mut() {
                *last = stem;
            }
            self.consider(&stripped, method, Some(ext), &mut best);
        }

        best.map(|candidate| {
            let route = &self.routes[candidate.route];
            RouteMatch {
                target: &route.target,
                route,
                params: candidate.params,
                format: candidate.format,
            }
        })
    }

    fn consider(
        &self,
        segments: &[&str],
        method: &Method,
        format: Option<&str>,
        best: &mut Option<Candidate>,
    ) {
        let mut found = Vec::new();
        self.root.collect(segments, &mut Params::new(), &mut found);

        for (entry, params) in found {
            let Entry { route, literals } = self.entries[entry];
            let candidate_route = &self.routes[route];
            if !candidate_route.method.matches(method) {
                continue;
            }
            if format.is_some() && !candidate_route.pattern.has_format_suffix() {
                continue;
            }

            let better = match best {
                None => true,
                Some(current) => {
                    literals > current.literals
                        || (literals == current.literals
                            && (route < current.route
                                || (route == current.route && format.is_some())))
                }
            };
            if better {
                *best = Some(Candidate {
                    route,
                    literals,
                    params,
                    format: format.map(str::to_string),
                });
            }
        }
    }

    /// Builds the path for a named route.
    #[must_use]
    pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.named(name)?.pattern.generate(params)
    }

    /// Looks up a route by name.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Route<T>> {
        self.routes.iter().find(|r| r.name.as_deref() == Some(name))
    }

    /// The registered routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route<T>] {
        &self.routes
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn split_extension(segment: &str) -> Option<(&str, &str)> {
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some((stem, ext))
    }
}
