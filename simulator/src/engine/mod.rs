//! Workflow engine

pub mod animation;
pub mod fluctuation;
pub mod fsm;
pub mod handle;
pub mod state;

pub use fsm::{Control, EngineSettings, Outcome, WorkflowFsm};
pub use handle::WorkflowEngine;
pub use state::{WorkflowEvent, WorkflowRunState};
