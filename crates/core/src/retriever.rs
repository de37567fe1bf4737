//! Retriever trait — optional context augmentation.
//!
//! A retriever supplies contextual text that the assembler embeds into the
//! system message under a fixed heading. It is consulted at most once per
//! operation, before assembly, and its failure is never fatal: the engine
//! logs a diagnostic and proceeds with the unaugmented system message.

use crate::context::OperationContext;
use crate::error::RetrieverError;
use async_trait::async_trait;

/// The optional retrieval capability.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The retriever name (e.g., "vector_store").
    fn name(&self) -> &str;

    /// Retrieve context for the given input text.
    ///
    /// The operation's context is passed by reference so the retriever can
    /// write auxiliary data (source references and the like) that later hooks
    /// and tool executions observe through the same `user_context`.
    async fn retrieve(
        &self,
        text: &str,
        ctx: &OperationContext,
    ) -> std::result::Result<String, RetrieverError>;
}
