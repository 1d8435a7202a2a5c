//! Middleware for observability.
//!
//! Authentication stages live in `crate::auth::middleware`.

pub mod logging;

pub use logging::request_logging;
