//! Memory store trait

use simenv_core::{AgentId, Command, Result, VariableSet};

/// Read and write access to agent memories.
///
/// `HttpMemoryClient` talks to the memory service; tests substitute an
/// in-process store.
#[async_trait::async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch the flattened variable set of `agent`.
    async fn fetch(&self, agent: &AgentId) -> Result<VariableSet>;

    /// Send a command to `agent`. No acknowledgement is awaited beyond the
    /// request being delivered.
    async fn post(&self, agent: &AgentId, command: Command) -> Result<()>;
}
