//! No-op backend — memory disabled.

use async_trait::async_trait;
use conductor_core::error::MemoryError;
use conductor_core::memory::{Memory, MessageQuery, MessageRecord};
use conductor_core::message::Message;

/// A store that persists nothing and fetches nothing.
#[derive(Default)]
pub struct NoopStore;

#[async_trait]
impl Memory for NoopStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn get_messages(
        &self,
        _query: MessageQuery,
    ) -> std::result::Result<Vec<Message>, MemoryError> {
        Ok(Vec::new())
    }

    async fn add_message(&self, _record: MessageRecord) -> std::result::Result<(), MemoryError> {
        Ok(())
    }
}
