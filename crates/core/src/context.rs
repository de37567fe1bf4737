//! Per-operation context — the isolated state bag threaded through hooks and
//! tool executions.
//!
//! Every invocation of a generation entry point creates a brand-new
//! `OperationContext`; nothing is pooled or reused across calls. The context
//! is passed by reference (as an `Arc`) into every callback, never stored in
//! ambient/global state, which guarantees isolation even for concurrent
//! operations on the same agent.

use crate::step::Step;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Mutable key→value map owned exclusively by one operation.
pub type UserContext = HashMap<String, Value>;

/// Bookkeeping key holding the operation start time (RFC 3339).
pub const START_TIME_KEY: &str = "conductor.start_time";

/// Bookkeeping key holding the id of the operation's start timeline event.
pub const START_EVENT_KEY: &str = "conductor.start_event_id";

/// Isolated per-invocation state bag.
pub struct OperationContext {
    /// Unique id for this operation
    pub operation_id: String,

    /// The history entry this operation writes to
    pub history_id: String,

    /// When the operation started
    pub started_at: DateTime<Utc>,

    /// Caller-visible mutable state. Seeded from the caller's map by value —
    /// never the caller's backing storage.
    user_context: Mutex<UserContext>,

    /// Steps surfaced so far, in provider-completion order.
    steps: Mutex<Vec<Step>>,
}

impl OperationContext {
    /// Create a fresh context for one operation.
    ///
    /// If a seed map is given it is cloned: mutating the seed afterwards is
    /// never visible inside the context, and vice versa. Two bookkeeping keys
    /// for telemetry correlation are populated before any hook can observe
    /// the map.
    pub fn new(history_id: impl Into<String>, seed: Option<&UserContext>) -> Self {
        let started_at = Utc::now();
        let mut user_context = seed.cloned().unwrap_or_default();
        user_context.insert(START_TIME_KEY.into(), Value::String(started_at.to_rfc3339()));
        user_context.insert(
            START_EVENT_KEY.into(),
            Value::String(Uuid::new_v4().to_string()),
        );

        Self {
            operation_id: Uuid::new_v4().to_string(),
            history_id: history_id.into(),
            started_at,
            user_context: Mutex::new(user_context),
            steps: Mutex::new(Vec::new()),
        }
    }

    /// Set a user-context value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.user_context
            .lock()
            .expect("user context lock poisoned")
            .insert(key.into(), value);
    }

    /// Read a user-context value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.user_context
            .lock()
            .expect("user context lock poisoned")
            .get(key)
            .cloned()
    }

    /// Snapshot the whole user-context map.
    pub fn user_context(&self) -> UserContext {
        self.user_context
            .lock()
            .expect("user context lock poisoned")
            .clone()
    }

    /// Append a step to the operation's accumulator.
    pub fn record_step(&self, step: Step) {
        self.steps.lock().expect("step lock poisoned").push(step);
    }

    /// Snapshot the steps surfaced so far, in completion order.
    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().expect("step lock poisoned").clone()
    }
}

/// Execution context handed to in-flight tool calls. Wraps the current
/// operation's context so tools can observe and write operation-scoped state.
#[derive(Clone)]
pub struct ToolExecutionContext {
    pub operation: std::sync::Arc<OperationContext>,

    /// The conversation this operation belongs to, when the caller supplied one.
    pub conversation_id: Option<String>,
}
