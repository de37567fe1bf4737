//! Provider trait — the four-mode capability over LLM backends.
//!
//! A provider turns an assembled message list into output in one of four
//! modes: blocking text, streamed text, blocking structured object, streamed
//! structured object. For tool-enabled calls the provider runs the
//! tool-calling loop itself (via the `ToolRegistry` in the request) and
//! surfaces every committed step — text, tool_call, tool_result — through the
//! step sink in completion order. The orchestration engine guarantees that
//! whatever arrives on the sink is recorded, forwarded to hooks, and
//! published exactly once, in arrival order.

use crate::context::ToolExecutionContext;
use crate::error::ProviderError;
use crate::message::Message;
use crate::step::Step;
use crate::tool::ToolRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where providers commit steps as they complete. Unbounded: the engine's
/// step pump drains continuously, and step volume is bounded by the
/// provider's own iteration limit.
pub type StepSink = mpsc::UnboundedSender<Step>;

/// A generation request forwarded to the provider.
pub struct GenerationRequest {
    /// The assembled conversation, system message first.
    pub messages: Vec<Message>,

    /// Tools the model may call. The provider executes them through the
    /// registry and reports each call/result pair on the step sink.
    pub tools: Arc<ToolRegistry>,

    /// Execution context for in-flight tool calls, wrapping the current
    /// operation's context. Present for tool-enabled and streaming calls.
    pub execution: Option<ToolExecutionContext>,

    /// Temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// Token usage information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete text generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGeneration {
    /// The final text response
    pub text: String,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// A complete structured-output generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectGeneration {
    /// The generated object, conforming to the requested schema
    pub object: serde_json::Value,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial text delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,

    /// Latest partial object (object-mode streams; cumulative)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The receiving half of a provider stream.
pub type ChunkReceiver = mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The four-mode Provider capability.
///
/// Every backend implements this trait; the orchestration engine calls one of
/// the four entry points without knowing which backend is in use. The step
/// sink contract is identical across modes: commit a step, then send it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// Generate a complete text response.
    async fn generate_text(
        &self,
        request: GenerationRequest,
        steps: StepSink,
    ) -> std::result::Result<TextGeneration, ProviderError>;

    /// Generate a streamed text response.
    ///
    /// Default implementation calls `generate_text()` and wraps the result as
    /// a single final chunk.
    async fn stream_text(
        &self,
        request: GenerationRequest,
        steps: StepSink,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let generation = self.generate_text(request, steps).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                delta: Some(generation.text),
                object: None,
                done: true,
                usage: generation.usage,
            }))
            .await;
        Ok(rx)
    }

    /// Generate a complete structured object conforming to `schema`.
    ///
    /// Default implementation reports the mode as unsupported.
    async fn generate_object(
        &self,
        _request: GenerationRequest,
        _schema: serde_json::Value,
        _steps: StepSink,
    ) -> std::result::Result<ObjectGeneration, ProviderError> {
        Err(ProviderError::NotSupported {
            provider: self.name().to_string(),
            mode: "generate_object".into(),
        })
    }

    /// Generate a streamed structured object conforming to `schema`.
    ///
    /// Default implementation calls `generate_object()` and wraps the result
    /// as a single final chunk.
    async fn stream_object(
        &self,
        request: GenerationRequest,
        schema: serde_json::Value,
        steps: StepSink,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let generation = self.generate_object(request, schema, steps).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                delta: None,
                object: Some(generation.object),
                done: true,
                usage: generation.usage,
            }))
            .await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    struct FixedProvider;

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate_text(
            &self,
            _request: GenerationRequest,
            steps: StepSink,
        ) -> std::result::Result<TextGeneration, ProviderError> {
            let _ = steps.send(Step::text("Hello!", Role::Assistant));
            Ok(TextGeneration {
                text: "Hello!".into(),
                usage: Some(Usage { prompt_tokens: 5, completion_tokens: 2, total_tokens: 7 }),
                model: "fixed-model".into(),
            })
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            messages: vec![Message::system("be brief"), Message::user("hi")],
            tools: Arc::new(ToolRegistry::new()),
            execution: None,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn default_stream_wraps_complete_response() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut chunks = FixedProvider.stream_text(request(), tx).await.unwrap();

        let chunk = chunks.recv().await.unwrap().unwrap();
        assert_eq!(chunk.delta.as_deref(), Some("Hello!"));
        assert!(chunk.done);

        // The step sink saw the committed text step
        let step = rx.recv().await.unwrap();
        assert_eq!(step.kind(), "text");
    }

    #[tokio::test]
    async fn object_mode_defaults_to_not_supported() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = FixedProvider
            .generate_object(request(), serde_json::json!({"type": "object"}), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotSupported { .. }));
    }
}
