//! Error types for the Conductor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Conductor operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Retriever errors ---
    #[error("Retriever error: {0}")]
    Retriever(#[from] RetrieverError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- History recording errors ---
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Construct a configuration error. Configuration problems fail fast at
    /// construction time and are never silently defaulted.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Generation mode not supported by provider '{provider}': {mode}")]
    NotSupported { provider: String, mode: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// An opaque provider failure. The message is surfaced to callers
    /// verbatim, with no prefix added by this variant.
    #[error("{0}")]
    Generation(String),
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrieverError {
    #[error("Retrieval failed: {0}")]
    Failed(String),

    #[error("Retriever unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

/// A lifecycle hook failure. Hook failures are logged and never abort the
/// operation that dispatched them.
#[derive(Debug, Clone, Error)]
#[error("Hook '{hook}' failed: {reason}")]
pub struct HookError {
    pub hook: String,
    pub reason: String,
}

impl HookError {
    pub fn new(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { hook: hook.into(), reason: reason.into() }
    }
}

#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    #[error("Unknown history entry: {0}")]
    UnknownEntry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn generation_error_message_is_verbatim() {
        let err = ProviderError::Generation("Stream error".into());
        assert_eq!(err.to_string(), "Stream error");
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::InvalidArguments {
            tool_name: "calculator".into(),
            reason: "missing required field 'expr'".into(),
        });
        assert!(err.to_string().contains("calculator"));
        assert!(err.to_string().contains("expr"));
    }

    #[test]
    fn hook_error_names_the_hook() {
        let err = HookError::new("on_start", "database offline");
        assert!(err.to_string().contains("on_start"));
    }
}
