//! The agent and its four generation entry points.

use crate::assembler::assemble;
use crate::hooks::{AgentHooks, OperationEnd, OperationOutput};
use crate::stream::OperationStream;
use conductor_config::EngineConfig;
use conductor_core::context::{OperationContext, ToolExecutionContext, UserContext};
use conductor_core::error::{Error, ProviderError, Result};
use conductor_core::event::EventBus;
use conductor_core::memory::{Memory, MessageQuery, MessageRecord};
use conductor_core::message::{AgentInput, Message, Role};
use conductor_core::provider::{ChunkReceiver, GenerationRequest, Provider, StepSink, StreamChunk, Usage};
use conductor_core::retriever::Retriever;
use conductor_core::step::Step;
use conductor_core::tool::{Tool, ToolRegistry};
use conductor_history::HistoryManager;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// An agent: identity, collaborators, and the orchestration engine that
/// coordinates them. Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct Agent {
    pub(crate) inner: Arc<AgentInner>,
}

pub(crate) struct AgentInner {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) model: Option<String>,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) memory: Option<Arc<dyn Memory>>,
    pub(crate) retriever: Option<Arc<dyn Retriever>>,
    pub(crate) hooks: AgentHooks,
    pub(crate) history: Arc<HistoryManager>,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) context_limit: usize,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
}

/// Per-invocation options.
#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    /// User identity; enables the memory fetch/persist path
    pub user_id: Option<String>,

    /// Conversation this operation belongs to
    pub conversation_id: Option<String>,

    /// Seed for the operation's user context. Copied — the operation never
    /// shares storage with this map.
    pub user_context: Option<UserContext>,

    /// Override the agent's prior-message fetch limit for this call
    pub context_limit: Option<usize>,
}

/// Result of a blocking text generation.
#[derive(Debug, Clone)]
pub struct TextResult {
    pub text: String,
    pub usage: Option<Usage>,
    pub model: String,
    pub operation_id: String,
    pub history_id: String,
    pub steps: Vec<Step>,
}

/// Result of a blocking structured-output generation.
#[derive(Debug, Clone)]
pub struct ObjectResult {
    pub object: serde_json::Value,
    pub usage: Option<Usage>,
    pub model: String,
    pub operation_id: String,
    pub history_id: String,
    pub steps: Vec<Step>,
}

/// Everything one operation needs after its prologue ran.
struct OperationSetup {
    ctx: Arc<OperationContext>,
    history_id: String,
    conversation_id: Option<String>,
}

impl Agent {
    /// Start building an agent. Name and instructions are required identity;
    /// construction fails fast if either is empty.
    pub fn builder(
        name: impl Into<String>,
        instructions: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> AgentBuilder {
        AgentBuilder {
            id: None,
            name: name.into(),
            instructions: instructions.into(),
            model: None,
            provider,
            tools: ToolRegistry::new(),
            memory: None,
            retriever: None,
            hooks: AgentHooks::new(),
            bus: None,
            context_limit: 10,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Build from a validated [`EngineConfig`].
    pub fn from_config(config: &EngineConfig, provider: Arc<dyn Provider>) -> AgentBuilder {
        let mut builder = Self::builder(&config.agent.name, &config.agent.instructions, provider);
        builder.model = config.agent.model.clone();
        builder.temperature = config.generation.temperature;
        builder.max_tokens = config.generation.max_tokens;
        builder.context_limit = config.memory.context_limit;
        builder.bus = Some(Arc::new(EventBus::new(config.events.bus_capacity)));
        builder
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The process-wide timeline bus this agent publishes to.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    // ── Generation entry points ───────────────────────────────────────

    /// Generate a complete text response.
    pub async fn generate_text(
        &self,
        input: impl Into<AgentInput>,
        options: OperationOptions,
    ) -> Result<TextResult> {
        let input = input.into();
        let (setup, messages) = self.begin_operation(&input, &options).await;
        let (sink, pump) = self.spawn_step_pump(setup.ctx.clone(), setup.history_id.clone());
        let request = self.request(messages, &setup);

        let result = self.inner.provider.generate_text(request, sink).await;
        let _ = pump.await;

        match result {
            Ok(generation) => {
                self.settle_success(
                    &setup,
                    OperationOutput::Text(generation.text.clone()),
                    &input,
                    options.user_id.as_deref(),
                )
                .await;
                Ok(TextResult {
                    text: generation.text,
                    usage: generation.usage,
                    model: generation.model,
                    operation_id: setup.ctx.operation_id.clone(),
                    history_id: setup.history_id,
                    steps: setup.ctx.steps(),
                })
            }
            Err(e) => {
                self.settle_failure(&setup, &e).await;
                Err(Error::Provider(e))
            }
        }
    }

    /// Generate a streamed text response. The returned stream yields chunks
    /// lazily; the operation settles (history finalized, `on_end` fired) when
    /// the provider stream ends, whether or not the caller keeps polling.
    pub async fn stream_text(
        &self,
        input: impl Into<AgentInput>,
        options: OperationOptions,
    ) -> Result<OperationStream> {
        let input = input.into();
        let (setup, messages) = self.begin_operation(&input, &options).await;
        let (sink, pump) = self.spawn_step_pump(setup.ctx.clone(), setup.history_id.clone());
        let request = self.request(messages, &setup);

        match self.inner.provider.stream_text(request, sink).await {
            Ok(chunks) => Ok(self.drive_stream(setup, input, options.user_id, chunks, pump)),
            Err(e) => {
                let _ = pump.await;
                self.settle_failure(&setup, &e).await;
                Err(Error::Provider(e))
            }
        }
    }

    /// Generate a complete structured object conforming to `schema`.
    pub async fn generate_object(
        &self,
        input: impl Into<AgentInput>,
        schema: serde_json::Value,
        options: OperationOptions,
    ) -> Result<ObjectResult> {
        let input = input.into();
        let (setup, messages) = self.begin_operation(&input, &options).await;
        let (sink, pump) = self.spawn_step_pump(setup.ctx.clone(), setup.history_id.clone());
        let request = self.request(messages, &setup);

        let result = self.inner.provider.generate_object(request, schema, sink).await;
        let _ = pump.await;

        match result {
            Ok(generation) => {
                self.settle_success(
                    &setup,
                    OperationOutput::Object(generation.object.clone()),
                    &input,
                    options.user_id.as_deref(),
                )
                .await;
                Ok(ObjectResult {
                    object: generation.object,
                    usage: generation.usage,
                    model: generation.model,
                    operation_id: setup.ctx.operation_id.clone(),
                    history_id: setup.history_id,
                    steps: setup.ctx.steps(),
                })
            }
            Err(e) => {
                self.settle_failure(&setup, &e).await;
                Err(Error::Provider(e))
            }
        }
    }

    /// Generate a streamed structured object conforming to `schema`.
    pub async fn stream_object(
        &self,
        input: impl Into<AgentInput>,
        schema: serde_json::Value,
        options: OperationOptions,
    ) -> Result<OperationStream> {
        let input = input.into();
        let (setup, messages) = self.begin_operation(&input, &options).await;
        let (sink, pump) = self.spawn_step_pump(setup.ctx.clone(), setup.history_id.clone());
        let request = self.request(messages, &setup);

        match self.inner.provider.stream_object(request, schema, sink).await {
            Ok(chunks) => Ok(self.drive_stream(setup, input, options.user_id, chunks, pump)),
            Err(e) => {
                let _ = pump.await;
                self.settle_failure(&setup, &e).await;
                Err(Error::Provider(e))
            }
        }
    }

    // ── Operation internals ───────────────────────────────────────────

    /// Common prologue: history entry, fresh context, best-effort retrieval,
    /// best-effort memory fetch, assembly, `on_start`.
    async fn begin_operation(
        &self,
        input: &AgentInput,
        options: &OperationOptions,
    ) -> (OperationSetup, Vec<Message>) {
        let input_text = input.as_query_text();
        let history_id = self.inner.history.begin(&input_text);
        let ctx = Arc::new(OperationContext::new(&history_id, options.user_context.as_ref()));

        debug!(
            agent = %self.inner.name,
            operation_id = %ctx.operation_id,
            history_id = %history_id,
            "Operation started"
        );

        let retrieved = match &self.inner.retriever {
            Some(retriever) => match retriever.retrieve(&input_text, &ctx).await {
                Ok(text) if !text.is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    warn!(
                        retriever = retriever.name(),
                        error = %e,
                        "Retriever failed, proceeding without augmentation"
                    );
                    self.inner.history.note_retriever_failure(&history_id, &e.to_string());
                    None
                }
            },
            None => None,
        };

        let prior = match (&self.inner.memory, &options.user_id) {
            (Some(memory), Some(user_id)) => {
                let limit = options.context_limit.unwrap_or(self.inner.context_limit);
                match memory
                    .get_messages(MessageQuery {
                        user_id: user_id.clone(),
                        conversation_id: options.conversation_id.clone(),
                        limit,
                    })
                    .await
                {
                    Ok(messages) => messages,
                    Err(e) => {
                        warn!(memory = memory.name(), error = %e, "Memory fetch failed, proceeding without history");
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        let messages = assemble(&self.inner.instructions, retrieved.as_deref(), &prior, input);

        self.inner.hooks.dispatch_start(ctx.clone()).await;

        (
            OperationSetup {
                ctx,
                history_id,
                conversation_id: options.conversation_id.clone(),
            },
            messages,
        )
    }

    fn request(&self, messages: Vec<Message>, setup: &OperationSetup) -> GenerationRequest {
        GenerationRequest {
            messages,
            tools: self.inner.tools.clone(),
            execution: Some(ToolExecutionContext {
                operation: setup.ctx.clone(),
                conversation_id: setup.conversation_id.clone(),
            }),
            temperature: self.inner.temperature,
            max_tokens: self.inner.max_tokens,
        }
    }

    /// Consume the provider's step sink: each surfaced step is appended to
    /// the history entry (idempotent), mirrored into the operation context,
    /// forwarded to `on_step_finish`, and published on the timeline — in
    /// arrival order, exactly once.
    fn spawn_step_pump(
        &self,
        ctx: Arc<OperationContext>,
        history_id: String,
    ) -> (StepSink, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Step>();
        let agent = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(step) = rx.recv().await {
                match agent.inner.history.append_step(&history_id, step.clone()) {
                    Ok(true) => {
                        ctx.record_step(step.clone());
                        agent.inner.hooks.dispatch_step_finish(step).await;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Failed to record step"),
                }
            }
        });
        (tx, handle)
    }

    /// Forward provider chunks to the caller while accumulating the final
    /// output, then settle the operation once the provider stream ends.
    fn drive_stream(
        &self,
        setup: OperationSetup,
        input: AgentInput,
        user_id: Option<String>,
        mut chunks: ChunkReceiver,
        pump: JoinHandle<()>,
    ) -> OperationStream {
        let (out_tx, out_rx) = mpsc::channel::<std::result::Result<StreamChunk, ProviderError>>(64);
        let history_id = setup.history_id.clone();
        let operation_id = setup.ctx.operation_id.clone();
        let agent = self.clone();

        tokio::spawn(async move {
            let mut text = String::new();
            let mut object: Option<serde_json::Value> = None;
            let mut failure: Option<ProviderError> = None;

            while let Some(item) = chunks.recv().await {
                match item {
                    Ok(chunk) => {
                        if let Some(delta) = &chunk.delta {
                            text.push_str(delta);
                        }
                        if let Some(partial) = &chunk.object {
                            object = Some(partial.clone());
                        }
                        // A send failure means the caller dropped the stream;
                        // keep draining so the operation still settles.
                        let _ = out_tx.send(Ok(chunk)).await;
                    }
                    Err(e) => {
                        failure = Some(e.clone());
                        let _ = out_tx.send(Err(e)).await;
                        break;
                    }
                }
            }

            drop(chunks);
            let _ = pump.await;

            match failure {
                None => {
                    let output = match object {
                        Some(object) => OperationOutput::Object(object),
                        None => OperationOutput::Text(text),
                    };
                    agent
                        .settle_success(&setup, output, &input, user_id.as_deref())
                        .await;
                }
                Some(e) => agent.settle_failure(&setup, &e).await,
            }
        });

        OperationStream::new(history_id, operation_id, out_rx)
    }

    async fn settle_success(
        &self,
        setup: &OperationSetup,
        output: OperationOutput,
        input: &AgentInput,
        user_id: Option<&str>,
    ) {
        let rendered = output.render();

        // Uphold the final-step invariant when the provider left no trailing
        // text step.
        let last_is_text = matches!(setup.ctx.steps().last(), Some(Step::Text { .. }));
        if !last_is_text {
            let step = Step::text(rendered.clone(), Role::Assistant);
            if let Ok(true) = self.inner.history.append_step(&setup.history_id, step.clone()) {
                setup.ctx.record_step(step.clone());
                self.inner.hooks.dispatch_step_finish(step).await;
            }
        }

        if let Err(e) = self.inner.history.complete(&setup.history_id, &rendered) {
            warn!(error = %e, "Failed to finalize history entry");
        }

        self.persist_exchange(input, &rendered, user_id, setup.conversation_id.as_deref())
            .await;

        self.inner
            .hooks
            .dispatch_end(OperationEnd {
                output: Some(output),
                error: None,
                context: setup.ctx.clone(),
                conversation_id: setup.conversation_id.clone(),
            })
            .await;
    }

    async fn settle_failure(&self, setup: &OperationSetup, error: &ProviderError) {
        if let Err(e) = self.inner.history.fail(&setup.history_id, &error.to_string()) {
            warn!(error = %e, "Failed to finalize history entry");
        }

        self.inner
            .hooks
            .dispatch_end(OperationEnd {
                output: None,
                error: Some(error.clone()),
                context: setup.ctx.clone(),
                conversation_id: setup.conversation_id.clone(),
            })
            .await;
    }

    /// Write the exchange back to memory, best-effort.
    async fn persist_exchange(
        &self,
        input: &AgentInput,
        output: &str,
        user_id: Option<&str>,
        conversation_id: Option<&str>,
    ) {
        let (Some(memory), Some(user_id)) = (&self.inner.memory, user_id) else {
            return;
        };

        let mut outgoing: Vec<Message> = match input {
            AgentInput::Text(text) => vec![Message::user(text.clone())],
            AgentInput::Messages(list) => list.clone(),
        };
        outgoing.push(Message::assistant(output));

        for message in outgoing {
            let record = MessageRecord {
                user_id: user_id.to_string(),
                conversation_id: conversation_id.map(str::to_string),
                message,
            };
            if let Err(e) = memory.add_message(record).await {
                warn!(memory = memory.name(), error = %e, "Failed to persist message");
                return;
            }
        }
    }
}

/// Builder for [`Agent`]. Configuration problems fail at `build()`, never at
/// first use.
pub struct AgentBuilder {
    id: Option<String>,
    name: String,
    instructions: String,
    model: Option<String>,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    memory: Option<Arc<dyn Memory>>,
    retriever: Option<Arc<dyn Retriever>>,
    hooks: AgentHooks,
    bus: Option<Arc<EventBus>>,
    context_limit: usize,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AgentBuilder {
    /// Override the generated agent id (useful for stable node ids).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Register a tool. Fails fast on a duplicate name.
    pub fn tool(mut self, tool: Box<dyn Tool>) -> Result<Self> {
        self.tools.register(tool)?;
        Ok(self)
    }

    pub fn memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn hooks(mut self, hooks: AgentHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Share an existing event bus instead of creating a fresh one.
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// How many prior messages to fetch per operation (default 10).
    pub fn context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn build(self) -> Result<Agent> {
        if self.name.trim().is_empty() {
            return Err(Error::config("agent name must not be empty"));
        }
        if self.instructions.trim().is_empty() {
            return Err(Error::config("agent instructions must not be empty"));
        }
        if self.context_limit == 0 {
            return Err(Error::config("context_limit must be at least 1"));
        }

        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let bus = self.bus.unwrap_or_else(|| Arc::new(EventBus::default()));
        let history = Arc::new(HistoryManager::new(id.clone(), bus.clone()));

        Ok(Agent {
            inner: Arc::new(AgentInner {
                id,
                name: self.name,
                instructions: self.instructions,
                model: self.model,
                provider: self.provider,
                tools: Arc::new(self.tools),
                memory: self.memory,
                retriever: self.retriever,
                hooks: self.hooks,
                history,
                bus,
                context_limit: self.context_limit,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            }),
        })
    }
}
