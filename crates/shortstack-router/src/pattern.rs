//! Route pattern compilation.
//!
//! A pattern such as `/posts(/:year(/:month))(.:format)` is compiled into a
//! list of [`Variant`]s, one per combination of optional groups:
//!
//! ```text
//! /posts
//! /posts/:year
//! /posts/:year/:month
//! ```
//!
//! A trailing `(.:format)` or `(.{format})` group is not expanded. It marks
//! the pattern as accepting a format suffix, which the router strips from the
//! last path segment and reports separately from the captures.

use crate::error::RouteError;

/// One segment of an expanded route variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must match exactly.
    Literal(String),
    /// Named capture of a single segment (`:id` or `{id}`).
    Capture(String),
    /// Glob capturing every remaining segment (`*path`).
    Glob(String),
}

/// A fully expanded route shape with no optional parts left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    segments: Vec<Segment>,
}

impl Variant {
    /// The segments making up this variant.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of literal segments, the router's specificity measure.
    #[must_use]
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Names of the captures and globs in this variant.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) | Segment::Glob(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// A compiled route pattern.
///
/// # Example
///
/// ```rust
/// use shortstack_router::Pattern;
///
/// let pattern = Pattern::parse("/posts(/:year(/:month))(.:format)").unwrap();
/// assert_eq!(pattern.variants().len(), 3);
/// assert!(pattern.has_format_suffix());
///
/// let url = pattern.generate(&[("year", "2024"), ("format", "json")]);
/// assert_eq!(url.as_deref(), Some("/posts/2024.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    variants: Vec<Variant>,
    format_suffix: bool,
}

#[derive(Debug)]
enum Piece {
    Text(String),
    Group(Vec<Piece>),
}

impl Pattern {
    /// Compiles a pattern string.
    pub fn parse(source: &str) -> Result<Self, RouteError> {
        let mut pieces = parse_pieces(source)?;

        let format_suffix = matches!(pieces.last(), Some(Piece::Group(group)) if is_format_group(group));
        if format_suffix {
            pieces.pop();
        }

        let mut variants: Vec<Variant> = Vec::new();
        for expanded in expand(&pieces) {
            let variant = compile_variant(source, &expanded)?;
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }

        Ok(Self {
            source: source.to_string(),
            variants,
            format_suffix,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expanded variants, shortest first.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Whether the pattern ends in a `(.:format)` group.
    #[must_use]
    pub fn has_format_suffix(&self) -> bool {
        self.format_suffix
    }

    /// Compiles this pattern again underneath `prefix`.
    pub fn prefixed(&self, prefix: &str) -> Result<Self, RouteError> {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Ok(self.clone());
        }
        let joined = if self.source.starts_with('/') || self.source.starts_with('(') {
            format!("{prefix}{}", self.source)
        } else {
            format!("{prefix}/{}", self.source)
        };
        Self::parse(&joined)
    }

    /// Builds a path from capture values.
    ///
    /// Picks the variant using the most captures that are all supplied, so
    /// optional groups are emitted only when their captures are given. A
    /// `format` value is appended as an extension when the pattern accepts
    /// one. Returns `None` when no variant can be satisfied.
    #[must_use]
    pub fn generate(&self, params: &[(&str, &str)]) -> Option<String> {
        let lookup = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

        let mut chosen: Option<&Variant> = None;
        for variant in &self.variants {
            if !variant.capture_names().all(|name| lookup(name).is_some()) {
                continue;
            }
            let better = chosen.map_or(true, |current| {
                variant.capture_names().count() > current.capture_names().count()
            });
            if better {
                chosen = Some(variant);
            }
        }
        let variant = chosen?;

        let mut path = String::new();
        for segment in variant.segments() {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Capture(name) | Segment::Glob(name) => path.push_str(lookup(name)?),
            }
        }
        if path.is_empty() {
            path.push('/');
        }

        if self.format_suffix {
            if let Some(format) = lookup("format") {
                path.push('.');
                path.push_str(format);
            }
        }
        Some(path)
    }
}

fn parse_pieces(source: &str) -> Result<Vec<Piece>, RouteError> {
    let unbalanced = || RouteError::UnbalancedGroup {
        pattern: source.to_string(),
    };

    let mut stack: Vec<Vec<Piece>> = vec![Vec::new()];
    let mut text = String::new();

    for ch in source.chars() {
        match ch {
            '(' => {
                flush(&mut text, &mut stack);
                stack.push(Vec::new());
            }
            ')' => {
                flush(&mut text, &mut stack);
                if stack.len() < 2 {
                    return Err(unbalanced());
                }
                let group = stack.pop().ok_or_else(unbalanced)?;
                stack
                    .last_mut()
                    .ok_or_else(unbalanced)?
                    .push(Piece::Group(group));
            }
            other => text.push(other),
        }
    }
    flush(&mut text, &mut stack);

    if stack.len() != 1 {
        return Err(unbalanced());
    }
    stack.pop().ok_or_else(unbalanced)
}

fn flush(text: &mut String, stack: &mut [Vec<Piece>]) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.push(Piece::Text(std::mem::take(text)));
    }
}

fn is_format_group(group: &[Piece]) -> bool {
    match group {
        [Piece::Text(text)] => text == ".:format" || text == ".{format}",
        _ => false,
    }
}

fn expand(pieces: &[Piece]) -> Vec<String> {
    let mut out = vec![String::new()];
    for piece in pieces {
        match piece {
            Piece::Text(text) => {
                for path in &mut out {
                    path.push_str(text);
                }
            }
            Piece::Group(inner) => {
                let options = expand(inner);
                let mut next = Vec::with_capacity(out.len() * (options.len() + 1));
                for base in &out {
                    next.push(base.clone());
                    for option in &options {
                        next.push(format!("{base}{option}"));
                    }
                }
                out = next;
            }
        }
    }
    out
}

fn compile_variant(source: &str, path: &str) -> Result<Variant, RouteError> {
    let empty = || RouteError::EmptyCapture {
        pattern: source.to_string(),
    };

    let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());

    for (i, text) in raw.iter().enumerate() {
        let segment = if let Some(name) = text.strip_prefix(':') {
            if name.is_empty() {
                return Err(empty());
            }
            Segment::Capture(name.to_string())
        } else if let Some(name) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            if name.is_empty() {
                return Err(empty());
            }
            Segment::Capture(name.to_string())
        } else if let Some(name) = text.strip_prefix('*') {
            if name.is_empty() {
                return Err(empty());
            }
            if i + 1 != raw.len() {
                return Err(RouteError::GlobNotLast {
                    pattern: source.to_string(),
                    name: name.to_string(),
                });
            }
            Segment::Glob(name.to_string())
        } else {
            Segment::Literal((*text).to_string())
        };
        segments.push(segment);
    }

    Ok(Variant { segments })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes(pattern: &Pattern) -> Vec<usize> {
        pattern.variants().iter().map(|v| v.segments().len()).collect()
    }

    #[test]
    fn test_plain_pattern_has_one_variant() {
        let pattern = Pattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.variants().len(), 1);
        assert_eq!(
            pattern.variants()[0].segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Capture("id".into())
            ]
        );
        assert!(!pattern.has_format_suffix());
    }

    #[test]
    fn test_brace_captures() {
        let pattern = Pattern::parse("/users/{id}").unwrap();
        assert_eq!(
            pattern.variants()[0].segments()[1],
            Segment::Capture("id".into())
        );
    }

    #[test]
    fn test_nested_optional_groups() {
        let pattern = Pattern::parse("/posts(/:year(/:month))").unwrap();
        assert_eq!(shapes(&pattern), vec![1, 2, 3]);
    }

    #[test]
    fn test_format_suffix_is_not_expanded() {
        let pattern = Pattern::parse("/posts(.:format)").unwrap();
        assert!(pattern.has_format_suffix());
        assert_eq!(shapes(&pattern), vec![1]);

        let braces = Pattern::parse("/posts(.{format})").unwrap();
        assert!(braces.has_format_suffix());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = Pattern::parse("/").unwrap();
        assert_eq!(shapes(&pattern), vec![0]);
        assert_eq!(pattern.generate(&[]).as_deref(), Some("/"));
    }

    #[test]
    fn test_literal_count() {
        let pattern = Pattern::parse("/posts/featured/:id").unwrap();
        assert_eq!(pattern.variants()[0].literal_count(), 2);
    }

    #[test]
    fn test_unbalanced_groups_rejected() {
        assert!(matches!(
            Pattern::parse("/posts(/:year"),
            Err(RouteError::UnbalancedGroup { .. })
        ));
        assert!(matches!(
            Pattern::parse("/posts)/:year"),
            Err(RouteError::UnbalancedGroup { .. })
        ));
    }

    #[test]
    fn test_glob_must_be_last() {
        let err = Pattern::parse("/files/*path/edit").unwrap_err();
        assert_eq!(
            err,
            RouteError::GlobNotLast {
                pattern: "/files/*path/edit".into(),
                name: "path".into()
            }
        );
    }

    #[test]
    fn test_empty_capture_rejected() {
        assert!(matches!(
            Pattern::parse("/users/:"),
            Err(RouteError::EmptyCapture { .. })
        ));
        assert!(matches!(
            Pattern::parse("/users/{}"),
            Err(RouteError::EmptyCapture { .. })
        ));
    }

    #[test]
    fn test_generate_uses_supplied_optionals_only() {
        let pattern = Pattern::parse("/posts(/:year(/:month))").unwrap();
        assert_eq!(pattern.generate(&[]).as_deref(), Some("/posts"));
        assert_eq!(
            pattern.generate(&[("year", "2024")]).as_deref(),
            Some("/posts/2024")
        );
        assert_eq!(
            pattern
                .generate(&[("year", "2024"), ("month", "05")])
                .as_deref(),
            Some("/posts/2024/05")
        );
    }

    #[test]
    fn test_generate_requires_mandatory_captures() {
        let pattern = Pattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.generate(&[]), None);
        assert_eq!(
            pattern.generate(&[("id", "3")]).as_deref(),
            Some("/users/3")
        );
    }

    #[test]
    fn test_prefixed() {
        let pattern = Pattern::parse("/").unwrap().prefixed("/other").unwrap();
        assert_eq!(pattern.source(), "/other/");
        assert_eq!(pattern.generate(&[]).as_deref(), Some("/other"));

        let nested = Pattern::parse("/posts/:id(.:format)")
            .unwrap()
            .prefixed("/blog/")
            .unwrap();
        assert_eq!(nested.source(), "/blog/posts/:id(.:format)");
        assert!(nested.has_format_suffix());
    }
}
