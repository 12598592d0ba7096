//! Observability for ShortStack.
//!
//! - **Logging**: a `tracing-subscriber` registry with an `EnvFilter` and a
//!   JSON or pretty formatter, plus the standard field names every crate
//!   logs with ([`logging::fields`]).
//! - **Metrics**: dispatch counters recorded through the `metrics` facade.
//!   No exporter is installed here; an application installs the recorder it
//!   wants and the counters flow into it.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `shortstack_dispatch_total` | Counter | `outcome` | Dispatches by how they ended |
//!
//! # Example
//!
//! ```
//! use shortstack_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig { enabled: false, ..LogConfig::default() };
//! init_logging(&config).unwrap();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{describe_metrics, record_dispatch, DispatchOutcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
