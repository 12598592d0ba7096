//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded or accepted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {} does not exist", path.display())]
    MissingFile {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("could not read config file {}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Only TOML and JSON sources are understood.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Malformed TOML, or TOML that does not fit the schema.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or JSON that does not fit the schema.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file could not be loaded.
    #[error("could not load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A value parsed but was rejected by validation.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field, such as `views.default_format`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be applied.
    #[error("environment override {var}: {reason}")]
    EnvOverride {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
