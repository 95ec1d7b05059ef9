//! Shared engine handle
//!
//! Owns the single [`WorkflowFsm`] and distributes its state: the latest
//! snapshot through a `watch` channel, discrete transitions through a
//! `broadcast` channel. Control calls apply synchronously under the lock and
//! wake the scheduler so it can re-plan its next deadline.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::{broadcast, watch, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::fsm::{Control, EngineSettings, Outcome, WorkflowFsm};
use crate::engine::state::{WorkflowEvent, WorkflowRunState};
use crate::errors::SimulatorError;

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 64;

/// Workflow engine shared by the scheduler and every consumer
pub struct WorkflowEngine {
    fsm: Mutex<WorkflowFsm>,
    state_tx: watch::Sender<WorkflowRunState>,
    events_tx: broadcast::Sender<WorkflowEvent>,
    schedule_changed: Notify,
}

impl WorkflowEngine {
    /// Build an engine in the idle state
    pub fn new(settings: EngineSettings, seed: Option<u64>) -> Result<Self, SimulatorError> {
        if settings.progress_fill_time() >= settings.step_dwell {
            warn!(
                "Progress bar needs {:?} but steps only last {:?}; it will be cut short",
                settings.progress_fill_time(),
                settings.step_dwell
            );
        }

        let fsm = WorkflowFsm::new(settings, seed)?;
        let (state_tx, _) = watch::channel(*fsm.state());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            fsm: Mutex::new(fsm),
            state_tx,
            events_tx,
            schedule_changed: Notify::new(),
        })
    }

    /// Begin a timed run; restarts from `complete`, no-op while running
    pub fn start(&self) {
        self.control(Control::Start);
    }

    /// Cancel all pending work and return to idle
    pub fn reset(&self) {
        self.control(Control::Reset);
    }

    /// Manually move to the next step
    pub fn advance(&self) {
        self.control(Control::Advance);
    }

    /// Override the progress percentage (clamped to 100)
    pub fn set_step_progress(&self, progress: u8) {
        self.control(Control::SetStepProgress(progress));
    }

    /// Latest published state
    pub fn snapshot(&self) -> WorkflowRunState {
        *self.state_tx.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<WorkflowRunState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to transition events
    pub fn events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events_tx.subscribe()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().next_deadline()
    }

    /// Fire every deadline due at `now` and publish the result
    pub fn tick(&self, now: Instant) {
        let mut fsm = self.lock();
        if fsm.tick(now) > 0 {
            self.publish(&mut fsm);
        }
    }

    /// Resolves once a control call has changed the schedule
    pub async fn schedule_changed(&self) {
        self.schedule_changed.notified().await;
    }

    fn control(&self, control: Control) {
        let mut fsm = self.lock();
        match fsm.process(control, Instant::now()) {
            Outcome::Applied => {
                debug!("Applied {:?}", control);
                self.publish(&mut fsm);
                drop(fsm);
                self.schedule_changed.notify_one();
            }
            Outcome::Ignored => {
                debug!(
                    "Ignored {:?} in step {}",
                    control,
                    fsm.state().current_step
                );
            }
        }
    }

    fn publish(&self, fsm: &mut WorkflowFsm) {
        let state = *fsm.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        for event in fsm.take_events() {
            match &event {
                WorkflowEvent::RunStarted { run_id } => info!(%run_id, "Workflow run started"),
                WorkflowEvent::RunCompleted { run_id } => info!(%run_id, "Workflow run complete"),
                WorkflowEvent::StepEntered { step, manual } => {
                    debug!(step = %step, manual, "Entered step")
                }
                WorkflowEvent::RestartScheduled => info!("Restarting workflow from complete"),
                WorkflowEvent::Reset => info!("Workflow reset"),
            }
            // no subscribers is fine
            let _ = self.events_tx.send(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowFsm> {
        self.fsm.lock().unwrap_or_else(|e| e.into_inner())
    }
}
