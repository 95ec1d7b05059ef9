//! Sensor reading models

use serde::{Deserialize, Serialize};

use crate::models::workflow::WorkflowStep;

/// A full set of simulated readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    /// Light intensity in lux
    pub light_intensity: f64,

    /// Panel voltage in volts
    pub voltage: f64,

    /// Panel current in amperes
    pub current: f64,

    /// Power in watts, always `voltage * current`
    pub power: f64,

    /// Conversion efficiency in percent, within [0, 100]
    pub efficiency: f64,
}

impl SensorData {
    /// All-zero readings
    pub const ZERO: SensorData = SensorData {
        light_intensity: 0.0,
        voltage: 0.0,
        current: 0.0,
        power: 0.0,
        efficiency: 0.0,
    };

    /// Recompute `power` from `voltage` and `current`
    pub fn recompute_power(&mut self) {
        self.power = self.voltage * self.current;
    }

    /// Clamp every field into its physical range and recompute power
    pub fn clamp(&mut self) {
        self.light_intensity = self.light_intensity.max(0.0);
        self.voltage = self.voltage.max(0.0);
        self.current = self.current.max(0.0);
        self.efficiency = self.efficiency.clamp(0.0, 100.0);
        self.recompute_power();
    }

    pub fn power_breakdown(&self) -> PowerBreakdown {
        PowerBreakdown::from_power(self.power)
    }
}

/// The individually simulated fields of [`SensorData`]
///
/// `power` is absent: it is always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorField {
    LightIntensity,
    Voltage,
    Current,
    Efficiency,
}

impl SensorField {
    /// First step at which the field carries a live reading
    pub fn live_from(self) -> WorkflowStep {
        match self {
            SensorField::LightIntensity => WorkflowStep::SolarInput,
            SensorField::Voltage | SensorField::Current => WorkflowStep::Sensors,
            SensorField::Efficiency => WorkflowStep::Output,
        }
    }

    pub fn is_live(self, step: WorkflowStep) -> bool {
        step.has_reached(self.live_from())
    }
}

/// Fields a step declares as its goal; `None` keeps the previous target
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetOverrides {
    pub light_intensity: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
    pub efficiency: Option<f64>,
}

impl TargetOverrides {
    /// Merge declared fields into `targets`, leaving the rest untouched
    pub fn apply_to(&self, targets: &mut SensorData) {
        if let Some(value) = self.light_intensity {
            targets.light_intensity = value;
        }
        if let Some(value) = self.voltage {
            targets.voltage = value;
        }
        if let Some(value) = self.current {
            targets.current = value;
        }
        if let Some(value) = self.power {
            targets.power = value;
        }
        if let Some(value) = self.efficiency {
            targets.efficiency = value;
        }
    }

    pub fn declares_efficiency(&self) -> bool {
        self.efficiency.is_some()
    }
}

/// Nominal light intensity under full sun
pub const NOMINAL_LIGHT_INTENSITY: f64 = 850.0;
/// Nominal panel voltage
pub const NOMINAL_VOLTAGE: f64 = 5.2;
/// Nominal panel current
pub const NOMINAL_CURRENT: f64 = 2.1;
/// Nominal power, `NOMINAL_VOLTAGE * NOMINAL_CURRENT`
pub const NOMINAL_POWER: f64 = 10.92;
/// Nominal conversion efficiency
pub const NOMINAL_EFFICIENCY: f64 = 87.0;

/// Target overrides declared by a step
pub fn targets_for(step: WorkflowStep) -> TargetOverrides {
    let light = Some(NOMINAL_LIGHT_INTENSITY);
    match step {
        WorkflowStep::Idle => TargetOverrides {
            light_intensity: Some(0.0),
            voltage: Some(0.0),
            current: Some(0.0),
            power: Some(0.0),
            efficiency: Some(0.0),
        },
        WorkflowStep::SolarInput => TargetOverrides {
            light_intensity: light,
            ..Default::default()
        },
        WorkflowStep::Sensors => TargetOverrides {
            light_intensity: light,
            voltage: Some(NOMINAL_VOLTAGE),
            current: Some(NOMINAL_CURRENT),
            ..Default::default()
        },
        WorkflowStep::Arduino => TargetOverrides {
            light_intensity: light,
            voltage: Some(NOMINAL_VOLTAGE),
            current: Some(NOMINAL_CURRENT),
            power: Some(NOMINAL_POWER),
            efficiency: None,
        },
        WorkflowStep::Output | WorkflowStep::Analytics | WorkflowStep::Complete => TargetOverrides {
            light_intensity: light,
            voltage: Some(NOMINAL_VOLTAGE),
            current: Some(NOMINAL_CURRENT),
            power: Some(NOMINAL_POWER),
            efficiency: Some(NOMINAL_EFFICIENCY),
        },
    }
}

/// Share of power delivered to the load
pub const OUTPUT_SHARE: f64 = 0.87;
/// Share of power lost in conversion
pub const LOSS_SHARE: f64 = 0.13;
/// Hours of generation assumed for a daily estimate
pub const DAILY_HOURS: f64 = 24.0;

/// Derived power analytics for a reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerBreakdown {
    /// Delivered power in watts
    pub output: f64,

    /// Lost power in watts
    pub loss: f64,

    /// Estimated daily energy in watt-hours
    pub daily_energy: f64,
}

impl PowerBreakdown {
    pub fn from_power(power: f64) -> Self {
        Self {
            output: power * OUTPUT_SHARE,
            loss: power * LOSS_SHARE,
            daily_energy: power * DAILY_HOURS,
        }
    }
}
