//! Configuration loading
//!
//! Layers, lowest precedence first: built-in defaults, legacy environment
//! variables (`OPENAI_API_KEY`, `WRITER_CHAT_MODEL_ID`, ...), `songsmith.yaml`,
//! `.songsmith/local.yaml`, then `SONGSMITH_`-prefixed variables.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
