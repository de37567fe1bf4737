//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use conductor_core::error::MemoryError;
use conductor_core::memory::{Memory, MessageQuery, MessageRecord};
use conductor_core::message::Message;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store that keeps messages in a Vec, in insertion order.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<MessageRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { records: Arc::new(RwLock::new(Vec::new())) }
    }

    /// Total number of stored messages, across all users.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Memory for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_messages(
        &self,
        query: MessageQuery,
    ) -> std::result::Result<Vec<Message>, MemoryError> {
        let records = self.records.read().await;

        let matching: Vec<&MessageRecord> = records
            .iter()
            .filter(|r| {
                r.user_id == query.user_id
                    && (query.conversation_id.is_none()
                        || r.conversation_id == query.conversation_id)
            })
            .collect();

        // Most recent `limit` messages, kept in chronological order
        let skip = matching.len().saturating_sub(query.limit);
        Ok(matching
            .into_iter()
            .skip(skip)
            .map(|r| r.message.clone())
            .collect())
    }

    async fn add_message(&self, record: MessageRecord) -> std::result::Result<(), MemoryError> {
        self.records.write().await.push(record);
        Ok(())
    }
}
