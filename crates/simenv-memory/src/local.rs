//! In-process memory store
//!
//! Holds agent memories in the same two-level layout the memory service
//! serves and records every posted command. Used to run triggers without a
//! memory service, e.g. in tests.

use crate::flatten::flatten_memory;
use crate::store::MemoryStore;
use simenv_core::{AgentId, Command, Error, Result, Value, VariableSet};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    memories: Mutex<HashMap<AgentId, serde_json::Map<String, Value>>>,
    posts: Mutex<Vec<(AgentId, Command)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` in `category` of `agent`, creating both as needed.
    pub fn set(&self, agent: impl Into<AgentId>, category: &str, name: &str, value: Value) {
        let mut memories = self.memories.lock().unwrap_or_else(|e| e.into_inner());
        let categories = memories.entry(agent.into()).or_default();
        let entries = categories
            .entry(category.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(map) = entries {
            map.insert(name.to_string(), value);
        }
    }

    /// Every command posted so far, oldest first.
    pub fn posts(&self) -> Vec<(AgentId, Command)> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl MemoryStore for InMemoryStore {
    async fn fetch(&self, agent: &AgentId) -> Result<VariableSet> {
        let memory = {
            let memories = self.memories.lock().unwrap_or_else(|e| e.into_inner());
            memories.get(agent).cloned()
        };
        match memory {
            Some(categories) => flatten_memory(&Value::Object(categories)),
            None => Err(Error::Service { status: 404, body: format!("agent {agent} not found") }),
        }
    }

    async fn post(&self, agent: &AgentId, command: Command) -> Result<()> {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((agent.clone(), command));
        Ok(())
    }
}
