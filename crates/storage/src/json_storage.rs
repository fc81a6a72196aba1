//! JSON file storage implementation.
//!
//! Stores the session snapshot as `session.json` under a root directory and
//! keeps a small meta marker (version + updated_at) beside it.

use std::path::{Path, PathBuf};
use deploy_progress::ProgressSnapshot;
use super::{SnapshotStore, Result};
use tokio::fs;
use tracing::debug;

const SESSION_FILE: &str = "session.json";
const META_FILE: &str = "session.meta.json";

/// File-based JSON snapshot store.
pub struct JsonSnapshotStore {
    root: PathBuf,
}

impl JsonSnapshotStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the session files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join(META_FILE)
    }

    /// Version of the stored snapshot (number of saves), 0 if never saved.
    pub async fn version(&self) -> Result<u64> {
        let meta: Option<serde_json::Value> = read_json(&self.meta_path()).await?;
        Ok(meta
            .and_then(|m| m.get("version").and_then(|v| v.as_u64()))
            .unwrap_or(0))
    }

    /// Read and increment the snapshot version, return new version.
    async fn bump_version(&self) -> Result<u64> {
        let version = self.version().await? + 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(self.meta_path(), serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.session_path(), json.as_bytes()).await?;

        let version = self.bump_version().await?;
        debug!("Saved session {} (version {})", snapshot.session_id, version);
        Ok(())
    }

    async fn load(&self) -> Result<Option<ProgressSnapshot>> {
        read_json(&self.session_path()).await
    }

    async fn clear(&mut self) -> Result<()> {
        for path in [self.session_path(), self.meta_path()] {
            fs::remove_file(&path).await.or_else(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
            })?;
        }
        debug!("Cleared session in {}", self.root.display());
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;
    use deploy_core::{StepName, TrackerError};
    use deploy_progress::DeploymentProgressTracker;

    #[tokio::test]
    async fn test_load_missing_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("session"));

        assert!(store.load().await.unwrap().is_none());
        assert_eq!(store.version().await.unwrap(), 0);
        assert!(matches!(
            store.load_tracker().await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_and_restore_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonSnapshotStore::new(dir.path().join("session"));

        let mut tracker = DeploymentProgressTracker::new();
        tracker.set_not_required(StepName::Whitelist);
        tracker.set_successful(StepName::SafeMathLibrary);
        tracker.set_failure_reason("token deployment reverted");
        store.save(&tracker.snapshot()).await.unwrap();
        store.save(&tracker.snapshot()).await.unwrap();
        assert_eq!(store.version().await.unwrap(), 2);

        let restored = store.load_tracker().await.unwrap();
        assert_eq!(restored.session_id(), tracker.session_id());
        assert_eq!(restored.next_pending_transaction(), Some(StepName::Token));
        assert!(!restored.is_required(StepName::Whitelist));
        assert_eq!(restored.failure_reason(), Some("token deployment reverted"));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonSnapshotStore::new(dir.path());

        store.save(&DeploymentProgressTracker::new().snapshot()).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        assert_eq!(store.version().await.unwrap(), 0);

        // Clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupted_step_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonSnapshotStore::new(dir.path());

        let mut snapshot = DeploymentProgressTracker::new().snapshot();
        snapshot.steps[3].name = "crowdSale".to_string();
        store.save(&snapshot).await.unwrap();

        match store.load_tracker().await {
            Err(StorageError::Tracker(TrackerError::UnknownStepName(name))) => {
                assert_eq!(name, "crowdSale")
            }
            other => panic!("unexpected result: {:?}", other.map(|t| t.session_id())),
        }
    }
}
