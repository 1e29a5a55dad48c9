//! Adapters connecting the pipeline to backends, storage and transports.

pub mod agents;
pub mod checkpoint;
pub mod http;
pub mod ideas;
