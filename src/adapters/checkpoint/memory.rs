//! Process-local checkpoint store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Checkpoint;
use crate::domain::ports::CheckpointStore;

#[derive(Default)]
struct Inner {
    checkpoints: HashMap<Uuid, Checkpoint>,
    claimed: HashSet<Uuid>,
}

/// In-memory checkpoint store; contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    inner: RwLock<Inner>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.checkpoints.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> DomainResult<()> {
        self.inner
            .write()
            .await
            .checkpoints
            .insert(checkpoint.id, checkpoint.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Option<Checkpoint>> {
        Ok(self.inner.read().await.checkpoints.get(&id).cloned())
    }

    async fn claim(&self, id: Uuid) -> DomainResult<Checkpoint> {
        let mut inner = self.inner.write().await;
        let checkpoint = inner
            .checkpoints
            .get(&id)
            .cloned()
            .ok_or(DomainError::CheckpointNotFound(id))?;
        if !inner.claimed.insert(id) {
            return Err(DomainError::CheckpointBusy(id));
        }
        Ok(checkpoint)
    }

    async fn release(&self, id: Uuid) -> DomainResult<()> {
        self.inner.write().await.claimed.remove(&id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        inner.checkpoints.remove(&id);
        inner.claimed.remove(&id);
        Ok(())
    }
}
