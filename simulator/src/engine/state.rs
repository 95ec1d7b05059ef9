//! Consumer-visible engine state

use serde::Serialize;
use uuid::Uuid;

use crate::models::sensor::SensorData;
use crate::models::workflow::WorkflowStep;

/// Snapshot of the simulation as consumers see it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRunState {
    pub current_step: WorkflowStep,
    pub is_running: bool,
    pub sensor_data: SensorData,
    /// Percentage of the current step's progress bar, 0 to 100
    pub step_progress: u8,
}

impl Default for WorkflowRunState {
    fn default() -> Self {
        Self {
            current_step: WorkflowStep::Idle,
            is_running: false,
            sensor_data: SensorData::ZERO,
            step_progress: 0,
        }
    }
}

impl WorkflowRunState {
    pub fn is_idle(&self) -> bool {
        self.current_step == WorkflowStep::Idle
    }
}

/// Discrete transitions, broadcast next to the snapshot stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A timed run began at its first step
    RunStarted { run_id: Uuid },

    /// A step became current
    StepEntered { step: WorkflowStep, manual: bool },

    /// The run reached `complete`
    RunCompleted { run_id: Uuid },

    /// `start()` from `complete` zeroed the state; the new run is pending
    RestartScheduled,

    /// `reset()` returned the engine to idle
    Reset,
}
