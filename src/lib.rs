//! simenv - polling environment for agent simulations
//!
//! Triggers registered on a `TriggerRegistry` are polled by a
//! `PollingExecutor` against the memory service; `scenarios` holds the
//! rule sets bundled with the `simenv` binary.

pub mod cli;
pub mod logging;
pub mod scenarios;

pub use simenv_core::{AgentId, Command, Error, Result, SimenvConfig, Value, VariableSet};
pub use simenv_memory::{HttpMemoryClient, InMemoryStore, MemoryStore};
pub use simenv_runtime::{
    callback_fn, Callback, CancellationToken, PollingExecutor, RunReport, TriggerContext,
    TriggerRegistry, WorkerOutcome,
};
