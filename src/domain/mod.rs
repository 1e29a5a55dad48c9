//! Domain layer for the songsmith lyric pipeline
//!
//! This module contains core business types, errors and the ports
//! adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{AgentInvocationError, DomainError, DomainResult};
