//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, LogFormat, ShortStackConfig};

/// Loads a [`ShortStackConfig`] in layers, later layers overriding earlier
/// ones:
///
/// 1. Defaults (or a preset)
/// 2. A TOML or JSON file, replacing the defaults
/// 3. `PREFIX__SECTION__KEY` environment variables, optionally seeded from
///    a `.env` file
///
/// # Example
///
/// ```
/// use shortstack_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[dispatch]\nhandle_errors = false", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert!(!config.dispatch.handle_errors);
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ShortStackConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ShortStackConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ShortStackConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ShortStackConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.config = parse(&content, &extension)
            .map_err(|err| match err {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;
        Ok(self)
    }

    /// Loads a file when it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in `format` (`"toml"` or `"json"`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Loads `.env` from the current directory or its parents, if present.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Loads a specific `.env` file.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` overrides, applied at [`load`](Self::load).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<ShortStackConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let vars: Vec<(String, String)> =
                env::vars().filter(|(key, _)| key.starts_with(&marker)).collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ShortStackConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();
        let boolean = || parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"));

        match parts.as_slice() {
            ["DISPATCH", "HANDLE_ERRORS"] => self.config.dispatch.handle_errors = boolean()?,
            ["DISPATCH", "LOG_HTTP_ERRORS"] => self.config.dispatch.log_http_errors = boolean()?,
            ["DISPATCH", "DEFAULT_LAYOUT"] => {
                self.config.dispatch.default_layout =
                    (!value.is_empty()).then(|| value.to_string());
            }

            ["VIEWS", "PATHS"] => {
                self.config.views.paths = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ["VIEWS", "DEFAULT_FORMAT"] => self.config.views.default_format = value.to_string(),

            ["LOGGING", "ENABLED"] => self.config.logging.enabled = boolean()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            _ => {}
        }
        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<ShortStackConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
