//! Error types for simenv

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    #[error("memory service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("variable '{variable}' not found on agent '{agent}'")]
    MissingVariable { agent: String, variable: String },

    #[error("callback error: {0}")]
    Callback(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn missing_variable(agent: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::MissingVariable {
            agent: agent.into(),
            variable: variable.into(),
        }
    }

    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }

    /// Whether the failure happened while observing remote state, as opposed
    /// to inside integrator logic. Only observation failures are retried.
    pub fn is_observation(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Service { .. }
                | Self::MalformedResponse(_)
                | Self::MissingVariable { .. }
        )
    }
}
