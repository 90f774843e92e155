use advisor_core::error::StoreError;
use advisor_core::traits::{validate_thread_id, CheckpointStore};
use advisor_core::types::ThreadState;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Checkpoint store writing one JSON file per thread.
///
/// Layout: `<dir>/<thread_id>.json`. Saves write `<thread_id>.json.tmp` and
/// rename it into place, so a crash mid-write leaves the previous state
/// intact.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, thread_id: &str) -> Result<PathBuf, StoreError> {
        validate_thread_id(thread_id)?;
        Ok(self.dir.join(format!("{thread_id}.json")))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, thread_id: &str, state: &ThreadState) -> Result<(), StoreError> {
        let path = self.path_for(thread_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!(thread_id, stage = %state.stage, path = %path.display(), "Checkpoint saved");
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<ThreadState>, StoreError> {
        let path = self.path_for(thread_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self, thread_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(thread_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_thread_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::types::{Portfolio, WorkflowStage};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn make_test_dir() -> PathBuf {
        std::env::temp_dir().join(format!("advisor-checkpoints-{}", Uuid::new_v4()))
    }

    fn state(thread_id: &str) -> ThreadState {
        let mut state = ThreadState::new(thread_id, Portfolio::new("p1", "alice", dec!(10000000)));
        state.stage = WorkflowStage::AwaitingApproval;
        state
    }

    #[tokio::test]
    async fn test_save_load_survives_new_instance() {
        let dir = make_test_dir();
        let original = state("t-1");
        FileCheckpointStore::new(&dir)
            .save("t-1", &original)
            .await
            .unwrap();

        let reopened = FileCheckpointStore::new(&dir);
        let loaded = reopened.load("t-1").await.unwrap().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(reopened.list().await.unwrap(), vec!["t-1".to_string()]);
        assert!(!dir.join("t-1.json.tmp").exists());

        reopened.clear("t-1").await.unwrap();
        assert!(reopened.load("t-1").await.unwrap().is_none());
        reopened.clear("t-1").await.unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_rejects_path_like_thread_ids() {
        let store = FileCheckpointStore::new(make_test_dir());
        assert!(matches!(
            store.load("../escape").await,
            Err(StoreError::InvalidThreadId(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }
}
