//! The root configuration type.

use serde::{Deserialize, Serialize};
use shortstack_core::MimeTable;
use shortstack_telemetry::logging::create_env_filter;
use shortstack_telemetry::LogFormat;

use crate::{ConfigError, DispatchConfig, LoggingConfig, ViewsConfig};

/// Complete ShortStack configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use shortstack_config::ShortStackConfig;
///
/// let config = ShortStackConfig::default();
/// assert!(config.dispatch.handle_errors);
/// assert_eq!(config.views.default_format, "html");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ShortStackConfig {
    /// Dispatch behavior.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Template lookup.
    #[serde(default)]
    pub views: ViewsConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShortStackConfig {
    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// - `views.default_format` is not a known format
    /// - `logging.level` is not a valid filter directive
    /// - `dispatch.default_layout` is set but empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table = MimeTable::default();
        if table.resolve(&self.views.default_format).is_none() {
            return Err(ConfigError::invalid_value(
                "views.default_format",
                format!("unknown format `{}`", self.views.default_format),
            ));
        }

        if let Err(err) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", err.to_string()));
        }

        if self
            .dispatch
            .default_layout
            .as_deref()
            .is_some_and(|layout| layout.trim().is_empty())
        {
            return Err(ConfigError::invalid_value(
                "dispatch.default_layout",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Local development: raw errors surface to the caller, pretty debug logs.
    ///
    /// # Example
    ///
    /// ```
    /// use shortstack_config::ShortStackConfig;
    ///
    /// let config = ShortStackConfig::development();
    /// assert!(!config.dispatch.handle_errors);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.dispatch.handle_errors = false;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Production: errors are intercepted and rendered, JSON logs.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.dispatch.handle_errors = true;
        config.dispatch.log_http_errors = true;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}
