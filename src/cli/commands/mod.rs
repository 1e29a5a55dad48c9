//! CLI command implementations.

pub mod config;
pub mod context;
pub mod generate;
pub mod idea;
pub mod serve;
pub mod session;
