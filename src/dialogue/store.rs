//! `ConversationStore` trait and the in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::dialogue::state::{ConversationState, Scratch};
use crate::error::StateStoreError;

/// One user's conversation: current state plus scratch data.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationRecord {
    pub state: ConversationState,
    pub scratch: Scratch,
}

/// Per-user conversation persistence.
///
/// `clear` and `set_state` are idempotent; backends serialize writes per
/// user so overlapping delivery retries cannot interleave partial updates.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Current state and scratch for a user. Unknown users are Idle/empty.
    async fn get(&self, user_id: i64) -> Result<ConversationRecord, StateStoreError>;

    /// Set the named state, keeping scratch as-is.
    async fn set_state(
        &self,
        user_id: i64,
        state: ConversationState,
    ) -> Result<(), StateStoreError>;

    /// Replace the scratch snapshot.
    async fn put_scratch(&self, user_id: i64, scratch: &Scratch) -> Result<(), StateStoreError>;

    /// Drop the conversation entirely (back to Idle, scratch discarded).
    async fn clear(&self, user_id: i64) -> Result<(), StateStoreError>;
}

/// In-memory conversation store for tests and local runs.
#[derive(Default)]
pub struct MemoryConversationStore {
    records: Mutex<HashMap<i64, ConversationRecord>>,
}

impl MemoryConversationStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get(&self, user_id: i64) -> Result<ConversationRecord, StateStoreError> {
        let records = self.records.lock().await;
        Ok(records.get(&user_id).cloned().unwrap_or_default())
    }

    async fn set_state(
        &self,
        user_id: i64,
        state: ConversationState,
    ) -> Result<(), StateStoreError> {
        let mut records = self.records.lock().await;
        records.entry(user_id).or_default().state = state;
        Ok(())
    }

    async fn put_scratch(&self, user_id: i64, scratch: &Scratch) -> Result<(), StateStoreError> {
        let mut records = self.records.lock().await;
        records.entry(user_id).or_default().scratch = scratch.clone();
        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<(), StateStoreError> {
        let mut records = self.records.lock().await;
        records.remove(&user_id);
        Ok(())
    }
}
