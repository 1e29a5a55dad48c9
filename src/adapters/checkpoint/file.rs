//! Directory-backed checkpoint store.
//!
//! Each checkpoint is a pretty-printed `{id}.json` file. A resume lease is an
//! `{id}.lock` file created with `create_new`, so two processes sharing the
//! directory cannot resume the same checkpoint at once. A lock older than the
//! configured TTL is treated as abandoned and broken by the next claim.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Checkpoint;
use crate::domain::ports::CheckpointStore;

pub struct FileCheckpointStore {
    dir: PathBuf,
    lock_ttl: Option<Duration>,
}

impl FileCheckpointStore {
    /// Store whose locks never expire.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_ttl: None,
        }
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = Some(ttl);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn checkpoint_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn lock_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.lock"))
    }

    async fn acquire_lock(&self, id: Uuid) -> DomainResult<()> {
        let path = self.lock_path(id);
        match create_lock(&path).await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(lock_error(id, e)),
        }

        if !self.lock_expired(&path).await {
            return Err(DomainError::CheckpointBusy(id));
        }
        warn!(checkpoint_id = %id, path = %path.display(), "breaking stale checkpoint lock");
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        create_lock(&path).await.map_err(|e| lock_error(id, e))
    }

    async fn lock_expired(&self, path: &Path) -> bool {
        let Some(ttl) = self.lock_ttl else {
            return false;
        };
        match fs::metadata(path).await.and_then(|meta| meta.modified()) {
            Ok(modified) => modified.elapsed().unwrap_or_default() >= ttl,
            Err(_) => false,
        }
    }

    async fn ensure_dir(&self) -> DomainResult<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            DomainError::Storage(format!(
                "Failed to create checkpoint directory {}: {e}",
                self.dir.display()
            ))
        })
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> DomainResult<()> {
        self.ensure_dir().await?;
        let json = serde_json::to_string_pretty(checkpoint)?;
        let path = self.checkpoint_path(checkpoint.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        debug!(checkpoint_id = %checkpoint.id, path = %path.display(), "checkpoint saved");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Option<Checkpoint>> {
        match fs::read_to_string(self.checkpoint_path(id)).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn claim(&self, id: Uuid) -> DomainResult<Checkpoint> {
        self.acquire_lock(id).await?;

        match self.load(id).await {
            Ok(Some(checkpoint)) => Ok(checkpoint),
            Ok(None) => {
                self.release(id).await?;
                Err(DomainError::CheckpointNotFound(id))
            }
            Err(err) => {
                self.release(id).await?;
                Err(err)
            }
        }
    }

    async fn release(&self, id: Uuid) -> DomainResult<()> {
        match fs::remove_file(self.lock_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.release(id).await?;
        match fs::remove_file(self.checkpoint_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn create_lock(path: &Path) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map(|_| ())
}

fn lock_error(id: Uuid, err: std::io::Error) -> DomainError {
    match err.kind() {
        ErrorKind::AlreadyExists => DomainError::CheckpointBusy(id),
        ErrorKind::NotFound => DomainError::CheckpointNotFound(id),
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PauseMarker, PendingRequest, WorkflowInputs};

    fn checkpoint() -> Checkpoint {
        Checkpoint::new(
            WorkflowInputs::default().with_idea("Moving On"),
            PauseMarker::Awaiting {
                request: PendingRequest::song_idea("blueprint", None),
            },
        )
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoints"));
        let cp = checkpoint();

        store.save(&cp).await.unwrap();
        assert!(store.dir().join(format!("{}.json", cp.id)).exists());
        assert_eq!(store.load(cp.id).await.unwrap(), Some(cp));
    }

    #[tokio::test]
    async fn test_lock_file_lease() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let cp = checkpoint();
        store.save(&cp).await.unwrap();

        store.claim(cp.id).await.unwrap();
        let second = FileCheckpointStore::new(dir.path());
        assert!(matches!(second.claim(cp.id).await, Err(DomainError::CheckpointBusy(_))));

        store.release(cp.id).await.unwrap();
        assert!(second.claim(cp.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = Uuid::new_v4();
        assert!(store.load(id).await.unwrap().is_none());
        assert!(matches!(store.claim(id).await, Err(DomainError::CheckpointNotFound(_))));
        store.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_claim_leaves_no_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = Uuid::new_v4();

        assert!(matches!(store.claim(id).await, Err(DomainError::CheckpointNotFound(_))));
        assert!(!dir.path().join(format!("{id}.lock")).exists());
    }

    #[tokio::test]
    async fn test_held_lock_wins_over_rewritten_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let cp = checkpoint();
        store.save(&cp).await.unwrap();
        store.claim(cp.id).await.unwrap();

        // Another writer leaves an unreadable checkpoint behind the held lock.
        std::fs::write(dir.path().join(format!("{}.json", cp.id)), "{ not json").unwrap();
        assert!(matches!(store.claim(cp.id).await, Err(DomainError::CheckpointBusy(_))));
        assert!(dir.path().join(format!("{}.lock", cp.id)).exists());
    }

    #[tokio::test]
    async fn test_unreadable_checkpoint_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = Uuid::new_v4();
        std::fs::write(dir.path().join(format!("{id}.json")), "{ not json").unwrap();

        assert!(store.claim(id).await.is_err());
        assert!(!dir.path().join(format!("{id}.lock")).exists());
    }

    #[tokio::test]
    async fn test_stale_lock_is_broken_after_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cp = checkpoint();
        let crashed = FileCheckpointStore::new(dir.path());
        crashed.save(&cp).await.unwrap();
        crashed.claim(cp.id).await.unwrap();

        let patient = FileCheckpointStore::new(dir.path()).with_lock_ttl(Duration::from_secs(3600));
        assert!(matches!(patient.claim(cp.id).await, Err(DomainError::CheckpointBusy(_))));

        let impatient = FileCheckpointStore::new(dir.path()).with_lock_ttl(Duration::ZERO);
        assert_eq!(impatient.claim(cp.id).await.unwrap(), cp);
        assert!(matches!(crashed.claim(cp.id).await, Err(DomainError::CheckpointBusy(_))));
    }
}
