//! Checkpoint store port for paused pipeline runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Checkpoint;

/// Key-value store of checkpoints keyed by checkpoint id.
///
/// Resuming a checkpoint is bracketed by [`claim`](Self::claim) and
/// [`release`](Self::release); at most one claim per id may be held at a time.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Insert or overwrite a checkpoint.
    async fn save(&self, checkpoint: &Checkpoint) -> DomainResult<()>;

    /// Fetch a checkpoint, `None` when the id is unknown.
    async fn load(&self, id: Uuid) -> DomainResult<Option<Checkpoint>>;

    /// Take the resume lease for `id`.
    ///
    /// # Errors
    /// - `CheckpointNotFound` if no checkpoint has this id
    /// - `CheckpointBusy` if another resume holds the lease
    async fn claim(&self, id: Uuid) -> DomainResult<Checkpoint>;

    /// Drop the resume lease. Releasing an unclaimed id is a no-op.
    async fn release(&self, id: Uuid) -> DomainResult<()>;

    /// Remove a checkpoint and any lease on it.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
}
