//! Captured path parameters.
//!
//! Captures are stored as ordered (name, value) pairs using a small-vector
//! optimization; most routes capture fewer than four values.

use smallvec::SmallVec;

/// Maximum number of captures stored inline.
const INLINE_PARAMS: usize = 4;

/// Values captured from the path by a route match.
///
/// # Example
///
/// ```rust
/// use shortstack_router::Params;
///
/// let mut params = Params::new();
/// params.push("year", "2024");
/// params.push("month", "05");
///
/// assert_eq!(params.get("year"), Some("2024"));
/// assert_eq!(params.get("day"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a capture named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Drops captures beyond the first `len`; used when backtracking.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates the captures in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = smallvec::IntoIter<[(String, String); INLINE_PARAMS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = Params::new();
        params.push("id", "123");
        assert_eq!(params.get("id"), Some("123"));
        assert!(params.contains("id"));
        assert!(!params.contains("name"));
    }

    #[test]
    fn test_truncate_backtracks() {
        let mut params = Params::new();
        params.push("a", "1");
        let mark = params.len();
        params.push("b", "2");
        params.truncate(mark);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("b"), None);
    }

    #[test]
    fn test_preserves_order_beyond_inline_capacity() {
        let mut params = Params::new();
        for i in 0..10 {
            params.push(format!("key{i}"), format!("value{i}"));
        }
        let names: Vec<_> = params.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names.first().map(String::as_str), Some("key0"));
        assert_eq!(names.last().map(String::as_str), Some("key9"));
    }

    #[test]
    fn test_into_iter_owned() {
        let params: Params = vec![("a".to_string(), "1".to_string())]
            .into_iter()
            .collect();
        let pairs: Vec<_> = params.into_iter().collect();
        assert_eq!(pairs, vec![("a".to_string(), "1".to_string())]);
    }
}
