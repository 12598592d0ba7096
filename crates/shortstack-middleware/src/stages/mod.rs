//! Built-in pipeline stages.

pub mod layout;
pub mod request_id;
pub mod rescue;

pub use layout::LayoutMiddleware;
pub use request_id::RequestIdMiddleware;
pub use rescue::RescueMiddleware;
