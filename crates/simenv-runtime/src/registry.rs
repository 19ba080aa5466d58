//! Trigger registry
//!
//! Triggers are collected with repeated `on(...)` calls and the registry is
//! then moved into a `PollingExecutor`. Nothing is validated here: empty
//! names, zero intervals and duplicate triggers are all kept as given.

use crate::callback::Callback;
use simenv_core::AgentId;
use std::sync::Arc;
use std::time::Duration;

/// One (agent, variable, interval, callback) binding. Drives one worker.
#[derive(Clone)]
pub struct Trigger {
    pub agent: AgentId,
    pub variable: Arc<str>,
    pub interval: Duration,
    pub callback: Arc<dyn Callback>,
}

impl Trigger {
    pub fn new(
        agent: impl Into<AgentId>,
        variable: impl Into<String>,
        interval: Duration,
        callback: Arc<dyn Callback>,
    ) -> Self {
        Self {
            agent: agent.into(),
            variable: Arc::from(variable.into()),
            interval,
            callback,
        }
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("agent", &self.agent)
            .field("variable", &self.variable)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Debug)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll `variable` of `agent` every `interval` and hand it to `callback`.
    pub fn on(
        &mut self,
        agent: impl Into<AgentId>,
        variable: impl Into<String>,
        interval: Duration,
        callback: impl Callback + 'static,
    ) -> &mut Self {
        self.register(Trigger::new(agent, variable, interval, Arc::new(callback)))
    }

    pub fn register(&mut self, trigger: Trigger) -> &mut Self {
        self.triggers.push(trigger);
        self
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn into_triggers(self) -> Vec<Trigger> {
        self.triggers
    }
}
