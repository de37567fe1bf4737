//! # Conductor Memory
//!
//! Conversation memory backends implementing the `conductor_core::Memory`
//! trait:
//! - `InMemoryStore` — Vec-backed, for testing and ephemeral sessions
//! - `NoopStore` — stores nothing, returns nothing

mod in_memory;
mod noop;

pub use in_memory::InMemoryStore;
pub use noop::NoopStore;
