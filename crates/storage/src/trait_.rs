//! Snapshot storage trait abstraction.

use async_trait::async_trait;
use deploy_core::TrackerError;
use deploy_progress::{DeploymentProgressTracker, ProgressSnapshot};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored snapshot could not be turned back into a tracker
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Storage abstraction for a persisted deployment session.
///
/// The tracker itself performs no I/O; a store sits beside it and saves
/// snapshots whenever the driver decides to.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Save a snapshot (create or overwrite).
    async fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<()>;

    /// Load the stored snapshot, if any.
    async fn load(&self) -> Result<Option<ProgressSnapshot>>;

    /// Remove the stored snapshot.
    async fn clear(&mut self) -> Result<()>;

    /// Load the stored snapshot and rebuild a tracker from it.
    async fn load_tracker(&self) -> Result<DeploymentProgressTracker> {
        let snapshot = self
            .load()
            .await?
            .ok_or_else(|| StorageError::NotFound("deployment session".to_string()))?;
        Ok(DeploymentProgressTracker::from_snapshot(&snapshot)?)
    }
}
