//! Telemetry model: workflow steps and sensor readings

pub mod sensor;
pub mod workflow;
