//! Checkpoint store implementations.

pub mod file;
pub mod memory;

use std::sync::Arc;

pub use file::FileCheckpointStore;
pub use memory::InMemoryCheckpointStore;

use crate::domain::models::{CheckpointBackend, CheckpointConfig};
use crate::domain::ports::CheckpointStore;

/// Build the configured checkpoint store.
pub fn from_config(config: &CheckpointConfig) -> Arc<dyn CheckpointStore> {
    match config.backend {
        CheckpointBackend::Memory => Arc::new(InMemoryCheckpointStore::new()),
        CheckpointBackend::File => Arc::new(
            FileCheckpointStore::new(config.dir.clone()).with_lock_ttl(config.lock_ttl()),
        ),
    }
}
