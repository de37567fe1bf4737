//! Memory trait — conversation persistence across operations.
//!
//! When an agent is configured with a memory store and the caller supplies a
//! user identity, the engine fetches up to `context_limit` prior messages
//! (default 10) once per operation and splices them directly after the system
//! message. After a successful operation the exchange is written back,
//! best-effort.

use crate::error::MemoryError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A query for prior conversation messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageQuery {
    /// The user whose history to fetch
    pub user_id: String,

    /// Restrict to one conversation, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Maximum number of messages to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub(crate) fn default_limit() -> usize {
    10
}

/// A message to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    pub message: Message,
}

/// The conversation memory capability.
///
/// Implementations: in-memory (testing/ephemeral), no-op, or any persistent
/// store in the host application. Returned messages are in original
/// chronological order.
#[async_trait]
pub trait Memory: Send + Sync {
    /// The backend name (e.g., "in_memory", "noop").
    fn name(&self) -> &str;

    /// Fetch up to `query.limit` most recent messages, oldest first.
    async fn get_messages(
        &self,
        query: MessageQuery,
    ) -> std::result::Result<Vec<Message>, MemoryError>;

    /// Persist one message.
    async fn add_message(&self, record: MessageRecord) -> std::result::Result<(), MemoryError>;
}
