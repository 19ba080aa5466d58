//! HTTP client for the memory service
//!
//! `GET  {base}/memory/{agent}` returns `{"memory": {<category>: {<name>: <value>}}}`.
//! `POST {base}/memory/{agent}` takes `{"actions": "<command>"}`.

use crate::flatten::flatten_memory;
use crate::store::MemoryStore;
use reqwest::Client;
use serde::Deserialize;
use simenv_core::{AgentId, Command, Error, InputRequest, MemoryConfig, Result, Value, VariableSet};
use tracing::{debug, warn};

pub struct HttpMemoryClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct MemoryResponse {
    memory: Option<Value>,
}

impl HttpMemoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base_url: config.base_url() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn memory_url(&self, agent: &AgentId) -> String {
        format!("{}/memory/{}", self.base_url, agent)
    }
}

fn network(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

#[async_trait::async_trait]
impl MemoryStore for HttpMemoryClient {
    async fn fetch(&self, agent: &AgentId) -> Result<VariableSet> {
        let url = self.memory_url(agent);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;

        if !status.is_success() {
            return Err(Error::Service { status: status.as_u16(), body });
        }

        let parsed: MemoryResponse = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("{agent}: {e}")))?;
        let memory = parsed
            .memory
            .ok_or_else(|| Error::MalformedResponse(format!("{agent}: no 'memory' field")))?;

        flatten_memory(&memory)
    }

    async fn post(&self, agent: &AgentId, command: Command) -> Result<()> {
        let url = self.memory_url(agent);
        debug!("POST {} actions={:?}", url, command.as_str());

        let response = self
            .client
            .post(&url)
            .json(&InputRequest { actions: command })
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Memory service rejected input for {}: {} {}", agent, status, body.trim());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = HttpMemoryClient::new("http://localhost:4000/");
        assert_eq!(client.memory_url(&AgentId::new("conv_S1")), "http://localhost:4000/memory/conv_S1");
    }

    #[test]
    fn from_config_uses_host_and_port() {
        let config = MemoryConfig { host: "coordinator".into(), port: 4100, timeout_ms: 250 };
        let client = HttpMemoryClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://coordinator:4100");
    }
}
