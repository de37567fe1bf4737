//! Read-only agent state for server and UI collaborators.

use crate::agent::Agent;
use conductor_history::HistoryEntry;
use serde::Serialize;

/// A stable reference to one of an agent's sub-resources. The node id is
/// deterministic (`{kind}_{name}_{agent_id}`) so external consumers can
/// correlate snapshots across polls.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRef {
    pub node_id: String,
    pub kind: String,
    pub name: String,
}

impl NodeRef {
    fn new(kind: &str, name: &str, agent_id: &str) -> Self {
        Self {
            node_id: format!("{kind}_{name}_{agent_id}"),
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

/// A complete point-in-time description of an agent: identity, wired
/// sub-resources, and the ordered history of its operations.
#[derive(Debug, Clone, Serialize)]
pub struct AgentFullState {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub model: Option<String>,
    pub provider: NodeRef,
    pub tools: Vec<NodeRef>,
    pub memory: Option<NodeRef>,
    pub retriever: Option<NodeRef>,
    pub history: Vec<HistoryEntry>,
}

impl Agent {
    /// Ordered snapshot of every operation this agent has run.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.history.entries()
    }

    /// Full state snapshot, including history.
    pub fn full_state(&self) -> AgentFullState {
        let inner = &self.inner;

        let mut tools: Vec<NodeRef> = inner
            .tools
            .names()
            .into_iter()
            .map(|name| NodeRef::new("tool", name, &inner.id))
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));

        AgentFullState {
            id: inner.id.clone(),
            name: inner.name.clone(),
            instructions: inner.instructions.clone(),
            model: inner.model.clone(),
            provider: NodeRef::new("provider", inner.provider.name(), &inner.id),
            tools,
            memory: inner
                .memory
                .as_ref()
                .map(|m| NodeRef::new("memory", m.name(), &inner.id)),
            retriever: inner
                .retriever
                .as_ref()
                .map(|r| NodeRef::new("retriever", r.name(), &inner.id)),
            history: self.history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_core::error::ProviderError;
    use conductor_core::provider::{GenerationRequest, Provider, StepSink, TextGeneration};

    struct NullProvider;

    #[async_trait::async_trait]
    impl Provider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        async fn generate_text(
            &self,
            _request: GenerationRequest,
            _steps: StepSink,
        ) -> Result<TextGeneration, ProviderError> {
            Ok(TextGeneration { text: String::new(), usage: None, model: "null".into() })
        }
    }

    #[test]
    fn node_ids_are_deterministic() {
        let agent = Agent::builder("helper", "Be helpful.", std::sync::Arc::new(NullProvider))
            .id("agent-1")
            .build()
            .unwrap();

        let state = agent.full_state();
        assert_eq!(state.provider.node_id, "provider_null_agent-1");
        assert!(state.tools.is_empty());
        assert!(state.memory.is_none());
        assert!(state.retriever.is_none());
        assert!(state.history.is_empty());
    }
}
