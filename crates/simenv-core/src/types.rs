//! Core types for simenv

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A variable value as reported by the memory service.
pub type Value = serde_json::Value;

/// Flattened view of every variable an agent holds, keyed by variable name.
pub type VariableSet = BTreeMap<String, Value>;

/// Agent identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AgentId(Arc<str>);

impl AgentId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An opaque state-changing instruction for an agent, e.g. `temperature = 21`.
///
/// Never parsed or validated here; the memory service interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Command {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Body of a write request to the memory service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InputRequest {
    pub actions: Command,
}

/// Read a value as a number, accepting JSON numbers and numeric strings.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_request_shape() {
        let req = InputRequest { actions: Command::new("temperature = 21") };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body, json!({"actions": "temperature = 21"}));
    }

    #[test]
    fn numeric_values() {
        assert_eq!(value_as_f64(&json!(20)), Some(20.0));
        assert_eq!(value_as_f64(&json!(20.5)), Some(20.5));
        assert_eq!(value_as_f64(&json!(" 19 ")), Some(19.0));
        assert_eq!(value_as_f64(&json!("warm")), None);
        assert_eq!(value_as_f64(&json!(true)), None);
    }
}
