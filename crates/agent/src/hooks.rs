//! Lifecycle hook dispatch.
//!
//! Hooks are a configuration struct with optional function fields — there is
//! no hook trait hierarchy. Per operation the dispatch order is strictly
//! `on_start → on_step_finish* → on_end`. Each hook is awaited before the
//! operation proceeds, and a failing hook is logged and skipped over:
//! hook failures never block later hooks, step recording, or finalization
//! (the same policy applied to retriever failures).

use conductor_core::context::OperationContext;
use conductor_core::error::{HookError, ProviderError};
use conductor_core::step::Step;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

type HookFuture = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send>>;

type OnStartFn = Box<dyn Fn(Arc<OperationContext>) -> HookFuture + Send + Sync>;
type OnStepFinishFn = Box<dyn Fn(Step) -> HookFuture + Send + Sync>;
type OnEndFn = Box<dyn Fn(OperationEnd) -> HookFuture + Send + Sync>;

/// What a settled operation produced.
#[derive(Debug, Clone)]
pub enum OperationOutput {
    Text(String),
    Object(serde_json::Value),
}

impl OperationOutput {
    /// Text rendering of the output, as recorded in the history entry.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Object(object) => object.to_string(),
        }
    }
}

/// Payload handed to `on_end`. Exactly one of `output` / `error` is set:
/// output on success, error on failure.
#[derive(Clone)]
pub struct OperationEnd {
    pub output: Option<OperationOutput>,
    pub error: Option<ProviderError>,
    pub context: Arc<OperationContext>,
    pub conversation_id: Option<String>,
}

/// The optional lifecycle callbacks of an agent.
#[derive(Default)]
pub struct AgentHooks {
    on_start: Option<OnStartFn>,
    on_step_finish: Option<OnStepFinishFn>,
    on_end: Option<OnEndFn>,
}

impl AgentHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per operation, after message assembly and before the
    /// provider is invoked.
    pub fn on_start<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<OperationContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_start = Some(Box::new(move |ctx| Box::pin(hook(ctx))));
        self
    }

    /// Called once per step, in the exact order the provider commits them.
    pub fn on_step_finish<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Step) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_step_finish = Some(Box::new(move |step| Box::pin(hook(step))));
        self
    }

    /// Called exactly once at operation end, with the result or the error.
    pub fn on_end<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(OperationEnd) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_end = Some(Box::new(move |end| Box::pin(hook(end))));
        self
    }

    pub(crate) async fn dispatch_start(&self, ctx: Arc<OperationContext>) {
        if let Some(hook) = &self.on_start {
            if let Err(e) = hook(ctx).await {
                warn!(hook = "on_start", error = %e, "Hook failed, continuing");
            }
        }
    }

    pub(crate) async fn dispatch_step_finish(&self, step: Step) {
        if let Some(hook) = &self.on_step_finish {
            if let Err(e) = hook(step).await {
                warn!(hook = "on_step_finish", error = %e, "Hook failed, continuing");
            }
        }
    }

    pub(crate) async fn dispatch_end(&self, end: OperationEnd) {
        if let Some(hook) = &self.on_end {
            if let Err(e) = hook(end).await {
                warn!(hook = "on_end", error = %e, "Hook failed, continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_core::message::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn absent_hooks_are_skipped() {
        let hooks = AgentHooks::new();
        hooks
            .dispatch_start(Arc::new(OperationContext::new("h1", None)))
            .await;
        hooks.dispatch_step_finish(Step::text("x", Role::Assistant)).await;
    }

    #[tokio::test]
    async fn failing_hook_does_not_block_later_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let hooks = AgentHooks::new()
            .on_start(|_ctx| async { Err(HookError::new("on_start", "boom")) })
            .on_step_finish(move |_step| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });

        hooks
            .dispatch_start(Arc::new(OperationContext::new("h1", None)))
            .await;
        hooks.dispatch_step_finish(Step::text("x", Role::Assistant)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn output_render_for_objects_is_json() {
        let output = OperationOutput::Object(serde_json::json!({"answer": 42}));
        assert_eq!(output.render(), r#"{"answer":42}"#);
    }
}
