//! # Conductor History
//!
//! The history/timeline recorder: one `HistoryEntry` per operation, a strict
//! `working → completed | error` state machine, idempotent order-preserving
//! step appends, and a `TimelineEvent` on the process-wide bus for every
//! mutation so external observers can reconstruct state without polling.

mod entry;
mod manager;

pub use entry::{EntryStatus, HistoryEntry};
pub use manager::HistoryManager;
