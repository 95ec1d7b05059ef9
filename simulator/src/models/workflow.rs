//! Workflow step models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SimulatorError;

/// A stage of the simulated acquisition-to-display pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStep {
    /// Initial and reset state, not part of the traversal order
    Idle,

    /// Sunlight reaches the panel
    SolarInput,

    /// Light and power sensors are read
    Sensors,

    /// The microcontroller processes the readings
    Arduino,

    /// Values are shown on the display
    Output,

    /// Readings are analysed
    Analytics,

    /// The run has finished
    Complete,
}

/// Fixed traversal order of a run
pub const STEP_ORDER: [WorkflowStep; 6] = [
    WorkflowStep::SolarInput,
    WorkflowStep::Sensors,
    WorkflowStep::Arduino,
    WorkflowStep::Output,
    WorkflowStep::Analytics,
    WorkflowStep::Complete,
];

impl WorkflowStep {
    /// Every step, `Idle` first
    pub const ALL: [WorkflowStep; 7] = [
        WorkflowStep::Idle,
        WorkflowStep::SolarInput,
        WorkflowStep::Sensors,
        WorkflowStep::Arduino,
        WorkflowStep::Output,
        WorkflowStep::Analytics,
        WorkflowStep::Complete,
    ];

    /// Position in [`STEP_ORDER`], `None` for `Idle`
    pub fn order_index(self) -> Option<usize> {
        STEP_ORDER.iter().position(|step| *step == self)
    }

    /// The step a manual advance moves to, if any
    pub fn successor(self) -> Option<WorkflowStep> {
        let next = self.order_index().map_or(0, |index| index + 1);
        STEP_ORDER.get(next).copied()
    }

    /// Whether this step is `other` or comes after it in the traversal order
    ///
    /// `Idle` is never reached, and reaches nothing.
    pub fn has_reached(self, other: WorkflowStep) -> bool {
        match (self.order_index(), other.order_index()) {
            (Some(current), Some(threshold)) => current >= threshold,
            _ => false,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            WorkflowStep::Idle => "Ready",
            WorkflowStep::SolarInput => "Solar Input",
            WorkflowStep::Sensors => "Sensor Reading",
            WorkflowStep::Arduino => "Processing",
            WorkflowStep::Output => "Display Output",
            WorkflowStep::Analytics => "Analytics",
            WorkflowStep::Complete => "Complete",
        }
    }

    /// Stable kebab-case identifier
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Idle => "idle",
            WorkflowStep::SolarInput => "solar-input",
            WorkflowStep::Sensors => "sensors",
            WorkflowStep::Arduino => "arduino",
            WorkflowStep::Output => "output",
            WorkflowStep::Analytics => "analytics",
            WorkflowStep::Complete => "complete",
        }
    }

    /// Narrative shown while the step is current
    pub fn info(self) -> StepInfo {
        match self {
            WorkflowStep::Idle => StepInfo {
                description: "System Ready",
                details: [
                    "Press Start to begin the workflow demonstration",
                    "All components initialized",
                    "Sensors calibrated",
                ],
            },
            WorkflowStep::SolarInput => StepInfo {
                description: "Solar Energy Collection",
                details: [
                    "Sunlight hits solar panel surface",
                    "Photons converted to electrical energy",
                    "Light intensity measured: 850 lux",
                ],
            },
            WorkflowStep::Sensors => StepInfo {
                description: "Sensor Data Acquisition",
                details: [
                    "BH1750 measuring light intensity",
                    "INA219 measuring voltage & current",
                    "Data transmitted via I2C protocol",
                ],
            },
            WorkflowStep::Arduino => StepInfo {
                description: "Data Processing",
                details: [
                    "Raw data received from sensors",
                    "Power calculation: P = V × I",
                    "Efficiency analysis in progress",
                ],
            },
            WorkflowStep::Output => StepInfo {
                description: "Display Output",
                details: [
                    "LCD displaying real-time values",
                    "Voltage, Current, Power shown",
                    "Efficiency percentage calculated",
                ],
            },
            WorkflowStep::Analytics => StepInfo {
                description: "Analytics Generation",
                details: [
                    "Historical data comparison",
                    "Performance trends analyzed",
                    "Optimization suggestions ready",
                ],
            },
            WorkflowStep::Complete => StepInfo {
                description: "Workflow Complete",
                details: [
                    "All data processed successfully",
                    "System operating at 87% efficiency",
                    "Ready for next cycle",
                ],
            },
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStep {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s.trim())
            .ok_or_else(|| SimulatorError::ValidationError(format!("Unknown workflow step: {}", s)))
    }
}

/// Description of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub description: &'static str,
    pub details: [&'static str; 3],
}

/// Simulated hardware along the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Sun,
    SolarPanel,
    /// BH1750
    LightSensor,
    /// INA219
    PowerSensor,
    /// Arduino UNO
    Microcontroller,
    /// 16x2 LCD
    Display,
    Cloud,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Sun,
        Component::SolarPanel,
        Component::LightSensor,
        Component::PowerSensor,
        Component::Microcontroller,
        Component::Display,
        Component::Cloud,
    ];

    /// First step at which the component takes part in the run
    pub fn activated_at(self) -> WorkflowStep {
        match self {
            Component::Sun | Component::SolarPanel => WorkflowStep::SolarInput,
            Component::LightSensor | Component::PowerSensor => WorkflowStep::Sensors,
            Component::Microcontroller => WorkflowStep::Arduino,
            Component::Display => WorkflowStep::Output,
            Component::Cloud => WorkflowStep::Analytics,
        }
    }

    pub fn is_active(self, step: WorkflowStep) -> bool {
        step.has_reached(self.activated_at())
    }

    pub fn label(self) -> &'static str {
        match self {
            Component::Sun => "Sun",
            Component::SolarPanel => "Solar Panel",
            Component::LightSensor => "BH1750 Sensor",
            Component::PowerSensor => "INA219 Sensor",
            Component::Microcontroller => "Arduino UNO",
            Component::Display => "LCD Display",
            Component::Cloud => "Cloud Analytics",
        }
    }
}

/// Components taking part in the given step
pub fn active_components(step: WorkflowStep) -> Vec<Component> {
    Component::ALL
        .into_iter()
        .filter(|component| component.is_active(step))
        .collect()
}
