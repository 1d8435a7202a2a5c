//! Storefront Backend Library
//!
//! Exposes the router, auth services and wiring for the binary and integration tests.

pub mod api;
pub mod app;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod middleware;

pub use app::{build_state, build_store};
pub use config::Config;
