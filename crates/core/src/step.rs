//! Steps — the units of provider progress.
//!
//! A step is one committed piece of work surfaced by the provider during an
//! operation: a text message, a tool invocation, or a tool result. Steps are
//! append-only and ordered by completion time. For a successful operation the
//! last step is always `text`, and every `tool_call` is eventually followed by
//! its matching `tool_result` before that final `text` step.

use crate::message::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of provider progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// A text message produced by the model.
    Text {
        id: String,
        content: String,
        role: Role,
    },

    /// The model invoked a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// A tool invocation completed.
    ToolResult {
        id: String,
        name: String,
        result: String,
    },
}

impl Step {
    /// Create a text step with a fresh id.
    pub fn text(content: impl Into<String>, role: Role) -> Self {
        Self::Text {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
        }
    }

    /// Create a tool call step. The id matches the provider's tool_call id so
    /// that the eventual result can be correlated.
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self::ToolCall { id: id.into(), name: name.into(), arguments }
    }

    /// Create a tool result step for a prior tool call.
    pub fn tool_result(
        id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::ToolResult { id: id.into(), name: name.into(), result: result.into() }
    }

    /// The step's unique id. Tool calls and their results share an id.
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } | Self::ToolCall { id, .. } | Self::ToolResult { id, .. } => id,
        }
    }

    /// The wire tag for this step variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
        }
    }

    /// A dedup key: tool calls and results share an id, so the kind tag is
    /// part of the identity used for idempotent appends.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.kind(), self.id())
    }
}
