//! Response formats and the mime table.
//!
//! A [`Format`] is a short symbolic name (`html`, `json`, ...). The
//! [`MimeTable`] maps formats to file extensions and media types, and is
//! ordered: the order is used whenever "every known format" is allowed.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A symbolic response format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Format(Cow<'static, str>);

impl Format {
    /// `text/html`
    pub const HTML: Self = Self(Cow::Borrowed("html"));
    /// `application/json`
    pub const JSON: Self = Self(Cow::Borrowed("json"));
    /// `application/xml`
    pub const XML: Self = Self(Cow::Borrowed("xml"));
    /// `text/plain`
    pub const TEXT: Self = Self(Cow::Borrowed("text"));
    /// `text/javascript`
    pub const JS: Self = Self(Cow::Borrowed("js"));
    /// `text/css`
    pub const CSS: Self = Self(Cow::Borrowed("css"));
    /// `text/csv`
    pub const CSV: Self = Self(Cow::Borrowed("csv"));
    /// `image/svg+xml`
    pub const SVG: Self = Self(Cow::Borrowed("svg"));
    /// `application/rss+xml`
    pub const RSS: Self = Self(Cow::Borrowed("rss"));
    /// `application/atom+xml`
    pub const ATOM: Self = Self(Cow::Borrowed("atom"));

    /// Creates a format from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The format name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Format {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Format {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// One row of the mime table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    format: Format,
    extensions: Vec<String>,
    media_types: Vec<String>,
}

impl MimeType {
    /// The format this row describes.
    #[must_use]
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// File extensions mapping to this format.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Media types mapping to this format; the first is the one sent as
    /// `Content-Type`.
    #[must_use]
    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }
}

/// Ordered mapping between formats, extensions and media types.
///
/// # Example
///
/// ```
/// use shortstack_core::{Format, MimeTable};
///
/// let table = MimeTable::default();
/// assert_eq!(table.by_extension("txt"), Some(&Format::TEXT));
/// assert_eq!(table.by_media_type("application/json"), Some(&Format::JSON));
/// assert_eq!(table.content_type(&Format::HTML), Some("text/html"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTable {
    entries: IndexMap<Format, MimeType>,
}

impl Default for MimeTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register(Format::HTML, &["html", "htm", "xhtml"], &["text/html", "application/xhtml+xml"]);
        table.register(Format::JSON, &["json"], &["application/json", "text/x-json"]);
        table.register(Format::XML, &["xml"], &["application/xml", "text/xml", "application/x-xml"]);
        table.register(Format::TEXT, &["text", "txt"], &["text/plain"]);
        table.register(
            Format::JS,
            &["js"],
            &["text/javascript", "application/javascript", "application/x-javascript"],
        );
        table.register(Format::CSS, &["css"], &["text/css"]);
        table.register(Format::CSV, &["csv"], &["text/csv"]);
        table.register(Format::SVG, &["svg"], &["image/svg+xml"]);
        table.register(Format::RSS, &["rss"], &["application/rss+xml"]);
        table.register(Format::ATOM, &["atom"], &["application/atom+xml"]);
        table
    }
}

impl MimeTable {
    /// A table with no formats.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Adds a format, or replaces the row of an already known one in place.
    pub fn register(&mut self, format: Format, extensions: &[&str], media_types: &[&str]) {
        let row = MimeType {
            format: format.clone(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            media_types: media_types.iter().map(|m| m.to_ascii_lowercase()).collect(),
        };
        // An existing key keeps its position.
        self.entries.insert(format, row);
    }

    /// Resolves a file extension.
    #[must_use]
    pub fn by_extension(&self, extension: &str) -> Option<&Format> {
        let extension = extension.to_ascii_lowercase();
        self.entries
            .values()
            .find(|e| e.extensions.iter().any(|x| *x == extension))
            .map(|e| &e.format)
    }

    /// Resolves a concrete media type such as `application/json`.
    #[must_use]
    pub fn by_media_type(&self, media_type: &str) -> Option<&Format> {
        let media_type = media_type.to_ascii_lowercase();
        self.entries
            .values()
            .find(|e| e.media_types.iter().any(|m| *m == media_type))
            .map(|e| &e.format)
    }

    /// Resolves an explicit format request: an extension or a format name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Format> {
        self.by_extension(name).or_else(|| {
            self.entries
                .keys()
                .find(|format| format.as_str().eq_ignore_ascii_case(name))
        })
    }

    /// The `Content-Type` sent for `format`.
    #[must_use]
    pub fn content_type(&self, format: &Format) -> Option<&str> {
        self.get(format)
            .and_then(|e| e.media_types.first())
            .map(String::as_str)
    }

    /// Looks up the row for `format`.
    #[must_use]
    pub fn get(&self, format: &Format) -> Option<&MimeType> {
        self.entries.get(format)
    }

    /// Every known format, in table order.
    pub fn formats(&self) -> impl Iterator<Item = &Format> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_has_two_extensions() {
        let table = MimeTable::default();
        assert_eq!(table.by_extension("text"), Some(&Format::TEXT));
        assert_eq!(table.by_extension("txt"), Some(&Format::TEXT));
    }

    #[test]
    fn test_html_comes_first() {
        let table = MimeTable::default();
        assert_eq!(table.formats().next(), Some(&Format::HTML));
    }

    #[test]
    fn test_unknown_lookups() {
        let table = MimeTable::default();
        assert_eq!(table.by_extension("exe"), None);
        assert_eq!(table.by_media_type("application/x-nope"), None);
        assert_eq!(table.resolve("nope"), None);
    }

    #[test]
    fn test_resolve_accepts_names_and_extensions() {
        let table = MimeTable::default();
        assert_eq!(table.resolve("txt"), Some(&Format::TEXT));
        assert_eq!(table.resolve("TEXT"), Some(&Format::TEXT));
        assert_eq!(table.resolve("json"), Some(&Format::JSON));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut table = MimeTable::default();
        let before: Vec<_> = table.formats().cloned().collect();
        table.register(Format::JSON, &["json", "jsn"], &["application/vnd.api+json"]);
        let after: Vec<_> = table.formats().cloned().collect();

        assert_eq!(before, after);
        assert_eq!(table.by_extension("jsn"), Some(&Format::JSON));
        assert_eq!(table.content_type(&Format::JSON), Some("application/vnd.api+json"));
    }

    #[test]
    fn test_register_new_format_appends() {
        let mut table = MimeTable::default();
        table.register(Format::new("yaml"), &["yaml", "yml"], &["application/x-yaml"]);
        assert_eq!(table.formats().last(), Some(&Format::new("yaml")));
        assert_eq!(table.by_extension("yml"), Some(&Format::new("yaml")));
    }

    #[test]
    fn test_owned_and_const_formats_compare_equal() {
        assert_eq!(Format::new("json"), Format::JSON);
        assert_eq!(Format::from("html").to_string(), "html");
    }
}
