//! Checkpoint store trait.

use crate::error::StoreError;
use crate::types::ThreadState;
use async_trait::async_trait;

/// Durable storage for per-thread workflow state.
///
/// Approval may arrive minutes or hours after suspension, so production
/// implementations must survive a process restart.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist the state of a thread, replacing any previous state.
    async fn save(&self, thread_id: &str, state: &ThreadState) -> Result<(), StoreError>;

    /// Load the state of a thread.
    ///
    /// Returns `Ok(None)` if nothing was saved for the thread.
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadState>, StoreError>;

    /// Remove all state for a thread.
    async fn clear(&self, thread_id: &str) -> Result<(), StoreError>;

    /// List the ids of all stored threads.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Check that a thread id is safe to use as a storage key.
pub fn validate_thread_id(thread_id: &str) -> Result<(), StoreError> {
    let valid = !thread_id.is_empty()
        && thread_id.len() <= 128
        && thread_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidThreadId(thread_id.to_string()))
    }
}
