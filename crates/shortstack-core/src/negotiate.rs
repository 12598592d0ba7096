//! Content negotiation.
//!
//! Picks the response format for a request from, in order of precedence:
//!
//! 1. an explicit format (path extension, else the `format` param),
//! 2. the `Accept` header,
//! 3. the first allowed format.
//!
//! The allowed formats are the action's declared formats, or every format in
//! the [`MimeTable`] when none are declared.

use std::cmp::Ordering;

use crate::error::HttpError;
use crate::format::{Format, MimeTable};

/// One media range from an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    /// Lowercased media range, such as `text/*`.
    pub media_range: String,
    /// Quality in `0.0..=1.0`.
    pub quality: f32,
}

/// Parses an `Accept` header into preferences, best first.
///
/// Ties keep header order. Ranges with `q=0` are dropped.
///
/// # Example
///
/// ```
/// use shortstack_core::negotiate::parse_accept;
///
/// let prefs = parse_accept("text/html;q=0.5, application/json, */*;q=0");
/// let ranges: Vec<_> = prefs.iter().map(|p| p.media_range.as_str()).collect();
/// assert_eq!(ranges, vec!["application/json", "text/html"]);
/// ```
#[must_use]
pub fn parse_accept(header: &str) -> Vec<Preference> {
    let mut prefs: Vec<Preference> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let media_range = pieces.next()?.trim().to_ascii_lowercase();
            if media_range.is_empty() {
                return None;
            }
            let quality = pieces
                .filter_map(|param| {
                    let (key, value) = param.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("q")
                        .then(|| value.trim().parse::<f32>().ok())
                        .flatten()
                })
                .next()
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            Some(Preference {
                media_range,
                quality,
            })
        })
        .filter(|p| p.quality > 0.0)
        .collect();

    // sort_by is stable
    prefs.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(Ordering::Equal)
    });
    prefs
}

/// Resolves the response format for one request.
///
/// `declared` is the action's ordered format list (empty means any known
/// format); `explicit` is a path extension or `format` param.
///
/// # Example
///
/// ```
/// use shortstack_core::{negotiate::negotiate, Format, MimeTable};
///
/// let table = MimeTable::default();
/// let declared = [Format::JSON, Format::XML, Format::TEXT];
///
/// let picked = negotiate(&table, &declared, Some("application/xml"), None).unwrap();
/// assert_eq!(picked, Format::XML);
///
/// let picked = negotiate(&table, &declared, Some("application/xml"), Some("txt")).unwrap();
/// assert_eq!(picked, Format::TEXT);
///
/// assert!(negotiate(&table, &declared, None, Some("svg")).is_err());
/// ```
pub fn negotiate(
    table: &MimeTable,
    declared: &[Format],
    accept: Option<&str>,
    explicit: Option<&str>,
) -> Result<Format, HttpError> {
    let allowed: Vec<&Format> = if declared.is_empty() {
        table.formats().collect()
    } else {
        declared.iter().collect()
    };

    if let Some(requested) = explicit.filter(|e| !e.is_empty()) {
        let format = table.resolve(requested).ok_or_else(|| {
            HttpError::not_acceptable(format!("unknown format `{requested}`"))
        })?;
        return if allowed.contains(&format) {
            Ok(format.clone())
        } else {
            Err(HttpError::not_acceptable(format!(
                "format `{format}` is not provided"
            )))
        };
    }

    let Some(first) = allowed.first() else {
        return Err(HttpError::not_acceptable("no formats are available"));
    };

    let prefs = match accept {
        Some(header) if !header.trim().is_empty() => parse_accept(header),
        _ => return Ok((*first).clone()),
    };

    if prefs.is_empty() || prefs.iter().any(|p| p.media_range == "*/*") {
        return Ok((*first).clone());
    }

    for pref in &prefs {
        if let Some(top) = pref.media_range.strip_suffix("/*") {
            let prefix = format!("{top}/");
            let hit = allowed.iter().find(|format| {
                table
                    .content_type(format)
                    .is_some_and(|ct| ct.starts_with(&prefix))
            });
            if let Some(format) = hit {
                return Ok((*format).clone());
            }
        } else if let Some(format) = table.by_media_type(&pref.media_range) {
            if allowed.contains(&format) {
                return Ok(format.clone());
            }
        }
    }

    Err(HttpError::not_acceptable(format!(
        "none of `{}` is provided",
        accept.unwrap_or_default()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared() -> Vec<Format> {
        vec![Format::JSON, Format::XML, Format::TEXT]
    }

    fn pick(accept: Option<&str>, explicit: Option<&str>) -> Result<Format, HttpError> {
        negotiate(&MimeTable::default(), &declared(), accept, explicit)
    }

    #[test]
    fn test_parse_accept_orders_by_quality() {
        let prefs = parse_accept("a/a;q=0.2, b/b, c/c;q=0.2, d/d;q=0.9");
        let ranges: Vec<_> = prefs.iter().map(|p| p.media_range.as_str()).collect();
        assert_eq!(ranges, vec!["b/b", "d/d", "a/a", "c/c"]);
    }

    #[test]
    fn test_parse_accept_tolerates_junk() {
        let prefs = parse_accept(" , text/html;level=1;q=bogus,,");
        assert_eq!(prefs.len(), 1);
        assert!((prefs[0].quality - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_accept_json() {
        assert_eq!(pick(Some("application/json"), None).unwrap(), Format::JSON);
    }

    #[test]
    fn test_full_wildcard_is_first_declared() {
        assert_eq!(pick(Some("*/*"), None).unwrap(), Format::JSON);
        assert_eq!(pick(Some("application/xml,*/*"), None).unwrap(), Format::JSON);
    }

    #[test]
    fn test_extension_overrides_accept() {
        assert_eq!(pick(Some("application/json"), Some("xml")).unwrap(), Format::XML);
        assert_eq!(pick(None, Some("text")).unwrap(), Format::TEXT);
        assert_eq!(pick(None, Some("txt")).unwrap(), Format::TEXT);
    }

    #[test]
    fn test_undeclared_or_unknown_extension_is_not_acceptable() {
        assert_eq!(pick(None, Some("svg")).unwrap_err().code(), 406);
        assert_eq!(pick(None, Some("bogus")).unwrap_err().code(), 406);
    }

    #[test]
    fn test_no_accept_is_first_declared() {
        assert_eq!(pick(None, None).unwrap(), Format::JSON);
        assert_eq!(pick(Some("  "), None).unwrap(), Format::JSON);
    }

    #[test]
    fn test_type_wildcard_uses_primary_media_type() {
        assert_eq!(pick(Some("text/*"), None).unwrap(), Format::TEXT);
    }

    #[test]
    fn test_quality_order_is_respected() {
        let accept = "application/json;q=0.4, application/xml";
        assert_eq!(pick(Some(accept), None).unwrap(), Format::XML);
    }

    #[test]
    fn test_zero_quality_excludes() {
        let accept = "application/json;q=0, text/plain";
        assert_eq!(pick(Some(accept), None).unwrap(), Format::TEXT);
    }

    #[test]
    fn test_nothing_matches() {
        assert_eq!(pick(Some("image/png"), None).unwrap_err().code(), 406);
    }

    #[test]
    fn test_empty_declared_allows_table_order() {
        let table = MimeTable::default();
        assert_eq!(negotiate(&table, &[], None, None).unwrap(), Format::HTML);
        assert_eq!(negotiate(&table, &[], Some("image/svg+xml"), None).unwrap(), Format::SVG);
        assert_eq!(negotiate(&table, &[], None, Some("csv")).unwrap(), Format::CSV);
    }
}
