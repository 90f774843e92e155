use advisor_core::error::StoreError;
use advisor_core::traits::{validate_thread_id, CheckpointStore};
use advisor_core::types::ThreadState;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Checkpoint store held in process memory. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    threads: RwLock<HashMap<String, ThreadState>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, thread_id: &str, state: &ThreadState) -> Result<(), StoreError> {
        validate_thread_id(thread_id)?;
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), state.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<ThreadState>, StoreError> {
        validate_thread_id(thread_id)?;
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), StoreError> {
        validate_thread_id(thread_id)?;
        self.threads.write().await.remove(thread_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.threads.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
