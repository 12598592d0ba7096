//! Typed configuration for ShortStack.
//!
//! - TOML and JSON configuration files
//! - `.env` files and `SHORTSTACK__SECTION__KEY` environment overrides
//! - Strict parsing (unknown fields are errors)
//! - Layered loading (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use shortstack_config::ConfigLoader;
//!
//! # fn main() -> Result<(), shortstack_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("shortstack.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("SHORTSTACK")
//!     .load()?;
//!
//! println!("errors intercepted: {}", config.dispatch.handle_errors);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! handle_errors = true
//! log_http_errors = true
//! default_layout = "application"
//!
//! [views]
//! paths = ["views"]
//! default_format = "html"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ShortStackConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{DispatchConfig, LoggingConfig, ViewsConfig};
pub use shortstack_telemetry::LogFormat;
