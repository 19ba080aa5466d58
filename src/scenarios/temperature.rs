//! Room temperature convectors
//!
//! Each room `R` has a convector agent `conv_R` whose `action` variable is
//! `increase`, `decrease` or anything else (idle), and a sensor agent
//! `temp_R` holding `temperature`. When the convector acts, the sensor's
//! temperature is moved one degree in that direction.

use async_trait::async_trait;
use simenv_core::{AgentId, Error, Result, Value, VariableSet};
use simenv_runtime::{Callback, TriggerContext, TriggerRegistry};
use std::time::Duration;
use tracing::{debug, info};

pub const CONVECTOR_VARIABLE: &str = "action";
pub const TEMPERATURE_VARIABLE: &str = "temperature";

pub fn convector_agent(room: &str) -> AgentId {
    AgentId::new(format!("conv_{room}"))
}

pub fn sensor_agent(room: &str) -> AgentId {
    AgentId::new(format!("temp_{room}"))
}

pub struct ConvectorRule {
    room: String,
    sensor: AgentId,
}

impl ConvectorRule {
    pub fn new(room: impl Into<String>) -> Self {
        let room = room.into();
        let sensor = sensor_agent(&room);
        Self { room, sensor }
    }
}

#[async_trait]
impl Callback for ConvectorRule {
    async fn call(&self, ctx: &TriggerContext, action: &Value, _variables: &VariableSet) -> Result<()> {
        let step = match action.as_str() {
            Some("increase") => 1,
            Some("decrease") => -1,
            _ => {
                debug!("Convector in {} idle ({})", self.room, action);
                return Ok(());
            }
        };

        let sensor_vars = ctx.variables_of(&self.sensor).await?;
        let current = sensor_vars
            .get(TEMPERATURE_VARIABLE)
            .ok_or_else(|| Error::missing_variable(self.sensor.as_str(), TEMPERATURE_VARIABLE))?;
        let next = step_temperature(current, step)?;

        info!("Room {}: temperature {} -> {}", self.room, current, next);
        ctx.post(&self.sensor, format!("{TEMPERATURE_VARIABLE} = {next}")).await
    }
}

/// Move a temperature reading by `step` degrees, keeping integers integral.
fn step_temperature(current: &Value, step: i64) -> Result<String> {
    let integer = current
        .as_i64()
        .or_else(|| current.as_str().and_then(|s| s.trim().parse::<i64>().ok()));
    if let Some(n) = integer {
        return n
            .checked_add(step)
            .map(|next| next.to_string())
            .ok_or_else(|| Error::callback(format!("temperature {current} out of range")));
    }
    simenv_core::value_as_f64(current)
        .map(|f| (f + step as f64).to_string())
        .ok_or_else(|| Error::callback(format!("temperature is not numeric: {current}")))
}

/// Register one convector trigger per room.
pub fn register_rooms(registry: &mut TriggerRegistry, rooms: &[String], interval: Duration) {
    for room in rooms {
        registry.on(convector_agent(room), CONVECTOR_VARIABLE, interval, ConvectorRule::new(room.as_str()));
    }
}
