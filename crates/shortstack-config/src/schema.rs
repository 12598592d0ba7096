//! Configuration sections.

use serde::{Deserialize, Serialize};
use shortstack_telemetry::{LogConfig, LogFormat};

/// Dispatch behavior.
///
/// # Example
///
/// ```
/// use shortstack_config::DispatchConfig;
///
/// let config = DispatchConfig::default();
/// assert!(config.handle_errors);
/// assert_eq!(config.default_layout, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Intercept handler errors and render them. When off, errors leave the
    /// stack as `Err` for the caller (or an outer rescue stage) to handle.
    #[serde(default = "default_true")]
    pub handle_errors: bool,

    /// Log typed HTTP errors as they are normalized.
    #[serde(default = "default_true")]
    pub log_http_errors: bool,

    /// Layout template applied when a handler does not choose one.
    #[serde(default)]
    pub default_layout: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handle_errors: true,
            log_http_errors: true,
            default_layout: None,
        }
    }
}

/// Template lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ViewsConfig {
    /// Template roots; later roots override earlier ones.
    #[serde(default = "default_view_paths")]
    pub paths: Vec<String>,

    /// Format used when an action declares none and nothing else decides.
    #[serde(default = "default_format")]
    pub default_format: String,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            paths: default_view_paths(),
            default_format: default_format(),
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// The telemetry settings for this section.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_view_paths() -> Vec<String> {
    vec!["views".to_string()]
}

fn default_format() -> String {
    "html".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults_from_empty_toml() {
        let dispatch: DispatchConfig = toml::from_str("").unwrap();
        assert_eq!(dispatch, DispatchConfig::default());

        let views: ViewsConfig = toml::from_str("").unwrap();
        assert_eq!(views.paths, vec!["views"]);
        assert_eq!(views.default_format, "html");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<DispatchConfig, _> = toml::from_str("handle_errorz = false");
        assert!(result.is_err());
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingConfig {
            enabled: true,
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        };
        let config = section.to_log_config();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file_line_info);
    }
}
