//! The operation orchestration engine — the heart of Conductor.
//!
//! One invocation of a generation entry point becomes a coordinated sequence
//! of effects:
//!
//! 1. **Begin** — a history entry is created (`working`) and a fresh
//!    `OperationContext` is allocated for this operation alone
//! 2. **Retrieve** — the optional retriever is consulted, best-effort
//! 3. **Assemble** — system message first, memory-fetched history next,
//!    caller input last
//! 4. **`on_start`** — fired once, before provider invocation
//! 5. **Invoke** — the provider runs (one of four modes); every step it
//!    surfaces is recorded, forwarded to `on_step_finish`, and published as
//!    a timeline event, in completion order, exactly once
//! 6. **Settle** — the entry is finalized (`completed` or `error`) and
//!    `on_end` fires exactly once with the result or the error
//!
//! Operations on one agent may run concurrently; their contexts and history
//! entries are never shared. Cancellation is not supported: a caller that
//! stops consuming a stream does not abort the underlying provider call.

mod agent;
mod assembler;
mod hooks;
mod snapshot;
mod stream;

pub use agent::{Agent, AgentBuilder, ObjectResult, OperationOptions, TextResult};
pub use assembler::{CONTEXT_HEADING, assemble};
pub use hooks::{AgentHooks, OperationEnd, OperationOutput};
pub use snapshot::{AgentFullState, NodeRef};
pub use stream::OperationStream;
