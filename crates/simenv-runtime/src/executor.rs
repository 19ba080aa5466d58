//! Polling executor
//!
//! One worker per registered trigger. Each worker loops forever:
//!
//! ```text
//! polling ──► evaluating ──► sleeping ──┐
//!    ▲                                  │
//!    └──────────────────────────────────┘
//! ```
//!
//! A worker stops when the cancellation token fires, or when a poll fails
//! under `FailurePolicy::Stop`. A panic inside a callback is caught at the
//! worker boundary, so a failing trigger never takes its siblings down.

use crate::callback::TriggerContext;
use crate::registry::{Trigger, TriggerRegistry};
use futures::FutureExt;
use simenv_core::{Error, ExecutorConfig, FailurePolicy, Result, RetryConfig, Value, VariableSet};
use simenv_memory::MemoryStore;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Stopped by the cancellation token.
    Cancelled,
    /// Gave up after a poll failed.
    Failed(String),
    /// A callback panicked.
    Panicked(String),
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Registration index of the trigger.
    pub index: usize,
    pub agent: String,
    pub variable: String,
    /// Number of successful observations handed to the callback.
    pub polls: u64,
    pub outcome: WorkerOutcome,
}

/// One report per trigger, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub workers: Vec<WorkerReport>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers
            .iter()
            .filter(|w| !matches!(w.outcome, WorkerOutcome::Cancelled))
    }
}

pub struct PollingExecutor {
    triggers: Vec<Trigger>,
    memory: Arc<dyn MemoryStore>,
    config: ExecutorConfig,
}

impl PollingExecutor {
    pub fn new(registry: TriggerRegistry, memory: Arc<dyn MemoryStore>) -> Self {
        Self {
            triggers: registry.into_triggers(),
            memory,
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Run every trigger until cancelled. Returns once all workers have stopped.
    pub async fn run(self, cancel: CancellationToken) -> RunReport {
        if self.triggers.is_empty() {
            debug!("No triggers registered, nothing to run");
            return RunReport::default();
        }

        info!(
            "Starting {} workers (on_failure={}, max_attempts={})",
            self.triggers.len(),
            self.config.on_failure,
            self.config.retry.attempts()
        );

        let mut workers = JoinSet::new();
        let mut expected = Vec::with_capacity(self.triggers.len());
        for (index, trigger) in self.triggers.into_iter().enumerate() {
            expected.push((trigger.agent.to_string(), trigger.variable.to_string()));
            let ctx = TriggerContext::new(
                trigger.agent.clone(),
                trigger.variable.clone(),
                self.memory.clone(),
            );
            let span = info_span!("trigger", agent = %trigger.agent, variable = %trigger.variable);
            let worker = Worker {
                index,
                trigger,
                ctx,
                config: self.config.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run().instrument(span));
        }

        let mut reports = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!("Worker task ended abnormally: {}", e),
            }
        }
        let reports = complete_reports(reports, expected);

        info!("All workers stopped");
        RunReport { workers: reports }
    }
}

struct Worker {
    index: usize,
    trigger: Trigger,
    ctx: TriggerContext,
    config: ExecutorConfig,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) -> WorkerReport {
        let mut polls = 0u64;
        let outcome = match AssertUnwindSafe(self.poll_loop(&mut polls)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Callback panicked, worker stopped: {}", message);
                WorkerOutcome::Panicked(message)
            }
        };

        WorkerReport {
            index: self.index,
            agent: self.trigger.agent.to_string(),
            variable: self.trigger.variable.to_string(),
            polls,
            outcome,
        }
    }

    async fn poll_loop(&self, polls: &mut u64) -> WorkerOutcome {
        loop {
            if self.cancel.is_cancelled() {
                return WorkerOutcome::Cancelled;
            }

            debug!("Executing on agent {}, variable {}", self.trigger.agent, self.trigger.variable);

            let result = match self.observe().await {
                Ok(Some((value, variables))) => {
                    *polls += 1;
                    tokio::select! {
                        _ = self.cancel.cancelled() => return WorkerOutcome::Cancelled,
                        r = self.trigger.callback.call(&self.ctx, &value, &variables) => r,
                    }
                }
                Ok(None) => return WorkerOutcome::Cancelled,
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                match self.config.on_failure {
                    FailurePolicy::Stop => {
                        error!("Poll failed, worker stopped: {}", e);
                        return WorkerOutcome::Failed(e.to_string());
                    }
                    FailurePolicy::Skip => warn!("Poll failed, waiting for next interval: {}", e),
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return WorkerOutcome::Cancelled,
                _ = tokio::time::sleep(self.trigger.interval) => {}
            }
        }
    }

    /// Fetch the agent's variables and pick out the watched one, retrying per
    /// the retry schedule. `Ok(None)` means cancelled while observing.
    async fn observe(&self) -> Result<Option<(Value, VariableSet)>> {
        let retry: &RetryConfig = &self.config.retry;
        let attempts = retry.attempts();
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(None),
                r = self.fetch_variable() => r,
            };

            match result {
                Ok(observed) => return Ok(Some(observed)),
                Err(e) if e.is_observation() && attempt < attempts => {
                    let delay = retry.delay_for(attempt);
                    warn!("Attempt {}/{} failed: {} (retrying in {:?})", attempt, attempts, e, delay);
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_variable(&self) -> Result<(Value, VariableSet)> {
        let variables = self.ctx.memory.fetch(&self.trigger.agent).await?;
        let value = variables
            .get(self.trigger.variable.as_ref())
            .cloned()
            .ok_or_else(|| {
                Error::missing_variable(self.trigger.agent.as_str(), self.trigger.variable.as_ref())
            })?;
        Ok((value, variables))
    }
}

/// Order reports by registration index, filling in a `Panicked` entry for
/// any worker whose task ended without producing one.
fn complete_reports(mut reports: Vec<WorkerReport>, expected: Vec<(String, String)>) -> Vec<WorkerReport> {
    let mut seen = vec![false; expected.len()];
    for report in &reports {
        if let Some(slot) = seen.get_mut(report.index) {
            *slot = true;
        }
    }
    for (index, (agent, variable)) in expected.into_iter().enumerate() {
        if !seen[index] {
            reports.push(WorkerReport {
                index,
                agent,
                variable,
                polls: 0,
                outcome: WorkerOutcome::Panicked("worker task ended abnormally".into()),
            });
        }
    }
    reports.sort_by_key(|r| r.index);
    reports
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
