//! Infrastructure layer module
//!
//! - Configuration management (figment layering plus legacy environment variables)
//! - Logging infrastructure (tracing subscriber setup)

pub mod config;
pub mod logging;
