//! Flattening of the two-level memory layout
//!
//! The memory service groups variables by category (`bool`, `integer`,
//! `float`, `text`, `time`, ...). Triggers address variables by name only, so
//! the categories are merged into a single map. Categories are merged in
//! ascending name order and a later category overwrites an earlier one, which
//! keeps the result independent of key order on the wire.

use simenv_core::{Error, Result, Value, VariableSet};
use std::collections::BTreeMap;
use tracing::debug;

pub fn flatten_memory(memory: &Value) -> Result<VariableSet> {
    let categories = memory
        .as_object()
        .ok_or_else(|| Error::MalformedResponse("'memory' is not an object".into()))?;

    // serde_json's Map may preserve insertion order depending on features; sort explicitly.
    let sorted: BTreeMap<&String, &Value> = categories.iter().collect();

    let mut variables = VariableSet::new();
    for (category, entries) in sorted {
        match entries.as_object() {
            Some(entries) => {
                for (name, value) in entries {
                    variables.insert(name.clone(), value.clone());
                }
            }
            None if entries.is_null() => {}
            None => debug!("Skipping non-object memory category '{}'", category),
        }
    }
    Ok(variables)
}
