//! # Conductor Core
//!
//! Domain types, capability traits, and error definitions for the Conductor
//! agent orchestration engine. Beyond serde and tokio's sync primitives (for
//! the event bus and step sink) this crate carries no framework dependencies
//! — it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (provider, memory, retriever, tool) is a trait
//! here. Implementations live in their respective crates or in the host
//! application. This enables:
//! - Swapping collaborators via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod context;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod provider;
pub mod retriever;
pub mod step;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use context::{OperationContext, ToolExecutionContext, UserContext};
pub use error::{Error, HookError, MemoryError, ProviderError, Result, RetrieverError, ToolError};
pub use event::{EventBus, TimelineEvent, TimelineEventKind};
pub use memory::{Memory, MessageQuery, MessageRecord};
pub use message::{AgentInput, Message, Role};
pub use provider::{GenerationRequest, ObjectGeneration, Provider, StepSink, StreamChunk, TextGeneration, Usage};
pub use retriever::Retriever;
pub use step::Step;
pub use tool::{Tool, ToolDefinition, ToolRegistry, ToolResult};
