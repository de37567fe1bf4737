//! Timeline event system — decoupled observation of operation progress.
//!
//! Every history-entry mutation is published as a `TimelineEvent` so external
//! listeners (server façade, UI) can reconstruct entry and step state
//! incrementally without polling the recorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// What kind of mutation a timeline event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    /// A new history entry was created (status = working)
    OperationStart,
    /// A step was appended to an entry
    StepRecorded,
    /// An entry was finalized as completed
    OperationCompleted,
    /// An entry was finalized as error
    OperationError,
    /// The optional retriever failed; the operation proceeded unaugmented
    RetrieverFailed,
}

impl TimelineEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OperationStart => "operation_start",
            Self::StepRecorded => "step_recorded",
            Self::OperationCompleted => "operation_completed",
            Self::OperationError => "operation_error",
            Self::RetrieverFailed => "retriever_failed",
        }
    }
}

/// An externally-observable notification of an entry/step mutation.
///
/// The payload carries enough data to reconstruct the mutated state without
/// re-querying the recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub key: TimelineEventKind,
    pub payload: serde_json::Value,
    pub history_id: String,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEvent {
    pub fn new(
        key: TimelineEventKind,
        payload: serde_json::Value,
        history_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            key,
            payload,
            history_id: history_id.into(),
            agent_id: agent_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A broadcast-based event bus for timeline events.
///
/// Uses `tokio::sync::broadcast` for fire-and-forget multi-consumer pub/sub
/// with no back-pressure: a slow subscriber lags and drops events, it never
/// blocks the emitting operation.
pub struct EventBus {
    sender: broadcast::Sender<Arc<TimelineEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TimelineEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TimelineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
