//! Stack setup errors.

use shortstack_config::ConfigError;
use shortstack_core::RenderError;
use thiserror::Error;

/// Errors raised while applying configuration to a [`StackBuilder`](crate::StackBuilder).
#[derive(Debug, Error)]
pub enum SetupError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A view root could not be loaded.
    #[error("failed to load views: {0}")]
    Render(#[from] RenderError),
}
