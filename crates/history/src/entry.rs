//! History entry — the persisted record of one operation's lifecycle.

use chrono::{DateTime, Utc};
use conductor_core::step::Step;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a history entry.
///
/// `Working` is the only non-terminal state. `Completed` and `Error` are
/// terminal and non-reentrant: once reached, the entry is read-only shared
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Working,
    Completed,
    Error,
}

impl EntryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Working)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted record of one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry id
    pub id: String,

    /// The caller's input, rendered as text
    pub input: String,

    /// Final output (completed entries) or error message (error entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Lifecycle status
    pub status: EntryStatus,

    /// When the operation started
    pub started_at: DateTime<Utc>,

    /// When the operation settled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Steps in provider-completion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

impl HistoryEntry {
    pub(crate) fn new(id: String, input: String) -> Self {
        Self {
            id,
            input,
            output: None,
            status: EntryStatus::Working,
            started_at: Utc::now(),
            ended_at: None,
            steps: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_working() {
        let entry = HistoryEntry::new("h1".into(), "Hello!".into());
        assert_eq!(entry.status, EntryStatus::Working);
        assert!(!entry.status.is_terminal());
        assert!(entry.output.is_none());
        assert!(entry.steps.is_empty());
    }

    #[test]
    fn terminal_statuses() {
        assert!(EntryStatus::Completed.is_terminal());
        assert!(EntryStatus::Error.is_terminal());
        assert_eq!(EntryStatus::Error.to_string(), "error");
    }

    #[test]
    fn entry_serialization() {
        let entry = HistoryEntry::new("h1".into(), "Hello!".into());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""status":"working""#));
    }
}
