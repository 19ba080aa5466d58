//! Callback trait invoked by polling workers

use simenv_core::{AgentId, Command, Result, Value, VariableSet};
use simenv_memory::MemoryStore;
use std::sync::Arc;

/// What a callback knows about the trigger that fired it, plus access to the
/// memory service so it can read other agents and send commands.
#[derive(Clone)]
pub struct TriggerContext {
    pub agent: AgentId,
    pub variable: Arc<str>,
    pub memory: Arc<dyn MemoryStore>,
}

impl TriggerContext {
    pub fn new(agent: AgentId, variable: impl Into<Arc<str>>, memory: Arc<dyn MemoryStore>) -> Self {
        Self { agent, variable: variable.into(), memory }
    }

    /// Fetch the variable set of any agent.
    pub async fn variables_of(&self, agent: &AgentId) -> Result<VariableSet> {
        self.memory.fetch(agent).await
    }

    /// Send a command to any agent.
    pub async fn post(&self, agent: &AgentId, command: impl Into<Command>) -> Result<()> {
        self.memory.post(agent, command.into()).await
    }
}

/// Integrator logic run on every poll of a trigger.
///
/// `value` is the current value of the watched variable; `variables` is the
/// whole variable set of the watched agent, fetched in the same request.
#[async_trait::async_trait]
pub trait Callback: Send + Sync {
    async fn call(&self, ctx: &TriggerContext, value: &Value, variables: &VariableSet) -> Result<()>;
}

/// Adapter for synchronous closures that only inspect values.
pub struct FnCallback<F>(F);

pub fn callback_fn<F>(f: F) -> FnCallback<F>
where
    F: Fn(&Value, &VariableSet) -> Result<()> + Send + Sync,
{
    FnCallback(f)
}

#[async_trait::async_trait]
impl<F> Callback for FnCallback<F>
where
    F: Fn(&Value, &VariableSet) -> Result<()> + Send + Sync,
{
    async fn call(&self, _ctx: &TriggerContext, value: &Value, variables: &VariableSet) -> Result<()> {
        (self.0)(value, variables)
    }
}
