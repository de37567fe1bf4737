//! Thread-safe history manager — records entries and steps, publishes
//! timeline events for every mutation.

use crate::entry::{EntryStatus, HistoryEntry};
use conductor_core::error::HistoryError;
use conductor_core::event::{EventBus, TimelineEvent, TimelineEventKind};
use conductor_core::step::Step;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// The per-agent history recorder.
///
/// Thread-safe via `RwLock`. Entries move `working → completed` or
/// `working → error`; both transitions are terminal and non-reentrant.
/// Step appends are idempotent and strictly order-preserving. Every
/// mutation also emits a `TimelineEvent` on the shared bus.
pub struct HistoryManager {
    agent_id: String,
    bus: Arc<EventBus>,
    /// All entries, oldest first.
    entries: RwLock<Vec<HistoryEntry>>,
    /// Dedup keys of steps already recorded, across all entries.
    recorded: RwLock<HashSet<String>>,
}

impl HistoryManager {
    pub fn new(agent_id: impl Into<String>, bus: Arc<EventBus>) -> Self {
        Self {
            agent_id: agent_id.into(),
            bus,
            entries: RwLock::new(Vec::new()),
            recorded: RwLock::new(HashSet::new()),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Create a new entry in `working` status and announce it. Returns the
    /// entry id.
    pub fn begin(&self, input: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        let entry = HistoryEntry::new(id.clone(), input.into());

        let payload = serde_json::json!({
            "input": entry.input,
            "status": entry.status,
            "started_at": entry.started_at,
        });
        self.entries.write().unwrap().push(entry);

        self.publish(TimelineEventKind::OperationStart, payload, &id);
        id
    }

    /// Append a step to an entry.
    ///
    /// Idempotent: a step already recorded (same kind and id) is ignored and
    /// `Ok(false)` is returned. Appends to a terminal entry are also ignored.
    pub fn append_step(&self, entry_id: &str, step: Step) -> Result<bool, HistoryError> {
        let dedup_key = format!("{entry_id}/{}", step.dedup_key());
        {
            let mut recorded = self.recorded.write().unwrap();
            if recorded.contains(&dedup_key) {
                debug!(entry_id, step = %step.dedup_key(), "Duplicate step append ignored");
                return Ok(false);
            }

            let mut entries = self.entries.write().unwrap();
            let entry = entries
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| HistoryError::UnknownEntry(entry_id.to_string()))?;

            if entry.status.is_terminal() {
                debug!(entry_id, "Step append after finalization ignored");
                return Ok(false);
            }

            entry.steps.push(step.clone());
            recorded.insert(dedup_key);
        }

        let payload = serde_json::json!({ "step": step });
        self.publish(TimelineEventKind::StepRecorded, payload, entry_id);
        Ok(true)
    }

    /// Finalize an entry as `completed` with its output.
    pub fn complete(&self, entry_id: &str, output: &str) -> Result<(), HistoryError> {
        self.finalize(entry_id, EntryStatus::Completed, output)
    }

    /// Finalize an entry as `error` with the error message.
    pub fn fail(&self, entry_id: &str, error: &str) -> Result<(), HistoryError> {
        self.finalize(entry_id, EntryStatus::Error, error)
    }

    fn finalize(
        &self,
        entry_id: &str,
        status: EntryStatus,
        output: &str,
    ) -> Result<(), HistoryError> {
        let payload;
        {
            let mut entries = self.entries.write().unwrap();
            let entry = entries
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| HistoryError::UnknownEntry(entry_id.to_string()))?;

            if entry.status.is_terminal() {
                debug!(entry_id, status = %entry.status, "Entry already finalized, ignoring");
                return Ok(());
            }

            entry.status = status;
            entry.output = Some(output.to_string());
            entry.ended_at = Some(chrono::Utc::now());

            payload = serde_json::json!({
                "status": entry.status,
                "output": entry.output,
                "ended_at": entry.ended_at,
            });
        }

        let kind = match status {
            EntryStatus::Completed => TimelineEventKind::OperationCompleted,
            _ => TimelineEventKind::OperationError,
        };
        self.publish(kind, payload, entry_id);
        Ok(())
    }

    /// Record a retriever failure diagnostic on the timeline. The operation
    /// itself proceeds unaugmented.
    pub fn note_retriever_failure(&self, entry_id: &str, error: &str) {
        self.publish(
            TimelineEventKind::RetrieverFailed,
            serde_json::json!({ "error": error }),
            entry_id,
        );
    }

    /// Snapshot one entry.
    pub fn entry(&self, entry_id: &str) -> Option<HistoryEntry> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
    }

    /// Snapshot all entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().unwrap().clone()
    }

    fn publish(&self, kind: TimelineEventKind, payload: serde_json::Value, entry_id: &str) {
        self.bus
            .publish(TimelineEvent::new(kind, payload, entry_id, &self.agent_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_core::message::Role;

    fn manager() -> (HistoryManager, tokio::sync::broadcast::Receiver<Arc<TimelineEvent>>) {
        let bus = Arc::new(EventBus::new(64));
        let rx = bus.subscribe();
        (HistoryManager::new("agent_1", bus), rx)
    }

    #[test]
    fn begin_creates_working_entry() {
        let (mgr, _rx) = manager();
        let id = mgr.begin("Hello!");

        let entry = mgr.entry(&id).unwrap();
        assert_eq!(entry.status, EntryStatus::Working);
        assert_eq!(entry.input, "Hello!");
    }

    #[test]
    fn steps_append_in_order_and_dedupe() {
        let (mgr, _rx) = manager();
        let id = mgr.begin("input");

        let call = Step::tool_call("c1", "calc", serde_json::json!({"expr": "2+2"}));
        assert!(mgr.append_step(&id, call.clone()).unwrap());
        // Same step again: idempotent
        assert!(!mgr.append_step(&id, call).unwrap());
        assert!(mgr.append_step(&id, Step::tool_result("c1", "calc", "4")).unwrap());
        assert!(mgr.append_step(&id, Step::text("It is 4", Role::Assistant)).unwrap());

        let entry = mgr.entry(&id).unwrap();
        assert_eq!(entry.steps.len(), 3);
        assert_eq!(entry.steps[0].kind(), "tool_call");
        assert_eq!(entry.steps[1].kind(), "tool_result");
        assert_eq!(entry.steps[2].kind(), "text");
    }

    #[test]
    fn unknown_entry_is_an_error() {
        let (mgr, _rx) = manager();
        let err = mgr
            .append_step("missing", Step::text("x", Role::Assistant))
            .unwrap_err();
        assert!(matches!(err, HistoryError::UnknownEntry(_)));
    }

    #[test]
    fn finalization_is_terminal_and_idempotent() {
        let (mgr, _rx) = manager();
        let id = mgr.begin("input");

        mgr.complete(&id, "done").unwrap();
        // Second finalization attempt is a no-op, not a state change
        mgr.fail(&id, "too late").unwrap();

        let entry = mgr.entry(&id).unwrap();
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.output.as_deref(), Some("done"));
        assert!(entry.ended_at.is_some());
    }

    #[test]
    fn no_steps_after_finalization() {
        let (mgr, _rx) = manager();
        let id = mgr.begin("input");
        mgr.fail(&id, "provider exploded").unwrap();

        let appended = mgr.append_step(&id, Step::text("late", Role::Assistant)).unwrap();
        assert!(!appended);
        assert!(mgr.entry(&id).unwrap().steps.is_empty());
    }

    #[tokio::test]
    async fn every_mutation_emits_a_timeline_event() {
        let (mgr, mut rx) = manager();
        let id = mgr.begin("input");
        mgr.append_step(&id, Step::text("hi", Role::Assistant)).unwrap();
        mgr.complete(&id, "hi").unwrap();

        let start = rx.recv().await.unwrap();
        assert_eq!(start.key, TimelineEventKind::OperationStart);
        assert_eq!(start.history_id, id);
        assert_eq!(start.agent_id, "agent_1");
        assert_eq!(start.payload["status"], "working");

        let step = rx.recv().await.unwrap();
        assert_eq!(step.key, TimelineEventKind::StepRecorded);
        assert_eq!(step.payload["step"]["type"], "text");

        let done = rx.recv().await.unwrap();
        assert_eq!(done.key, TimelineEventKind::OperationCompleted);
        assert_eq!(done.payload["output"], "hi");
    }

    #[test]
    fn entries_snapshot_is_ordered() {
        let (mgr, _rx) = manager();
        let first = mgr.begin("first");
        let second = mgr.begin("second");

        let entries = mgr.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].id, second);
    }
}
