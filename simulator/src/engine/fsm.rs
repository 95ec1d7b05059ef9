//! Finite state machine for the simulated workflow run
//!
//! Every timer of a run (auto-advance, progress bar, value animation, ambient
//! fluctuation, delayed restart) is a deadline owned by the machine. Control
//! operations and [`WorkflowFsm::tick`] are the only ways state changes, and
//! cancelling a timer is clearing its deadline, so a superseded run can never
//! leave a writer behind.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;
use uuid::Uuid;

use crate::engine::animation::Animation;
use crate::engine::fluctuation::{fluctuate, NoiseAmplitudes};
use crate::engine::state::{WorkflowEvent, WorkflowRunState};
use crate::errors::SimulatorError;
use crate::models::sensor::{targets_for, SensorData};
use crate::models::workflow::{WorkflowStep, STEP_ORDER};

/// Timing and noise settings of the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// How long a step stays current before the run moves on
    pub step_dwell: Duration,

    /// Progress bar cadence
    pub progress_interval: Duration,

    /// Percentage added to the progress bar per tick
    pub progress_increment: u8,

    /// Frames of the eased transition on step entry
    pub animation_frames: u32,

    /// Time between animation frames
    pub animation_frame_interval: Duration,

    /// Ambient fluctuation cadence
    pub fluctuation_interval: Duration,

    /// Pause between the reset and the new run when restarting from `complete`
    pub restart_delay: Duration,

    /// Fluctuation band per field
    pub noise: NoiseAmplitudes,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            step_dwell: Duration::from_millis(2500),
            progress_interval: Duration::from_millis(50),
            progress_increment: 4,
            animation_frames: 30,
            animation_frame_interval: Duration::from_millis(16),
            fluctuation_interval: Duration::from_millis(500),
            restart_delay: Duration::from_millis(100),
            noise: NoiseAmplitudes::default(),
        }
    }
}

impl EngineSettings {
    /// Reject settings under which a tick could never finish
    pub fn validate(&self) -> Result<(), SimulatorError> {
        let cadences = [
            ("step_dwell", self.step_dwell),
            ("progress_interval", self.progress_interval),
            ("animation_frame_interval", self.animation_frame_interval),
            ("fluctuation_interval", self.fluctuation_interval),
        ];
        if let Some((name, _)) = cadences.iter().find(|(_, d)| d.is_zero()) {
            return Err(SimulatorError::ConfigError(format!("{} must be greater than zero", name)));
        }
        if self.progress_increment == 0 {
            return Err(SimulatorError::ConfigError(
                "progress_increment must be greater than zero".to_string(),
            ));
        }
        if self.animation_frames == 0 {
            return Err(SimulatorError::ConfigError(
                "animation_frames must be greater than zero".to_string(),
            ));
        }
        if !self.noise.is_valid() {
            return Err(SimulatorError::ConfigError(
                "noise amplitudes must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Time the progress bar needs to reach 100%
    pub fn progress_fill_time(&self) -> Duration {
        let ticks = 100u32.div_ceil(u32::from(self.progress_increment.max(1)));
        self.progress_interval * ticks
    }
}

/// Control operations accepted by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Begin a timed run, or restart one from `complete`
    Start,

    /// Cancel everything and return to idle
    Reset,

    /// Manually move to the next step
    Advance,

    /// Override the progress percentage
    SetStepProgress(u8),
}

/// Result of a control operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed or a transition was scheduled
    Applied,

    /// The operation does not apply in the current state
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProgressTicker {
    value: u8,
    next_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledAdvance {
    index: usize,
    at: Instant,
}

/// Pending deadline kinds, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    Restart,
    Advance,
    Progress,
    Animation,
    Fluctuation,
}

/// Workflow run FSM
#[derive(Debug, Clone)]
pub struct WorkflowFsm {
    settings: EngineSettings,
    state: WorkflowRunState,
    targets: SensorData,
    run_id: Option<Uuid>,
    restart_at: Option<Instant>,
    advance: Option<ScheduledAdvance>,
    progress: Option<ProgressTicker>,
    animation: Option<Animation>,
    fluctuation_at: Option<Instant>,
    rng: StdRng,
    events: Vec<WorkflowEvent>,
}

impl WorkflowFsm {
    /// Create a machine in the idle state
    ///
    /// A `seed` makes the ambient noise reproducible.
    pub fn new(settings: EngineSettings, seed: Option<u64>) -> Result<Self, SimulatorError> {
        settings.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            settings,
            state: WorkflowRunState::default(),
            targets: SensorData::ZERO,
            run_id: None,
            restart_at: None,
            advance: None,
            progress: None,
            animation: None,
            fluctuation_at: None,
            rng,
            events: Vec::new(),
        })
    }

    /// Get current state
    pub fn state(&self) -> &WorkflowRunState {
        &self.state
    }

    /// Resolved goal readings of the current step
    pub fn targets(&self) -> &SensorData {
        &self.targets
    }

    /// Timing and noise settings the machine was built with
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Identifier of the current timed run, if one was started
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Earliest pending deadline, `None` when nothing is scheduled
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due().map(|(at, _)| at)
    }

    /// Events produced since the last call
    pub fn take_events(&mut self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut self.events)
    }

    /// Process a control operation at `now`
    pub fn process(&mut self, control: Control, now: Instant) -> Outcome {
        match control {
            Control::Start => self.start(now),
            Control::Reset => {
                self.reset();
                Outcome::Applied
            }
            Control::Advance => self.advance(now),
            Control::SetStepProgress(progress) => {
                self.state.step_progress = progress.min(100);
                Outcome::Applied
            }
        }
    }

    /// Fire every deadline up to and including `now`
    ///
    /// Deadlines fire in chronological order at their scheduled instant, not
    /// at `now`, so cadences do not drift with scheduler latency. Returns the
    /// number of deadlines fired.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some((at, due)) = self.next_due() {
            if at > now {
                break;
            }
            self.fire(due, at);
            fired += 1;
        }
        fired
    }

    // ============================== CONTROL ================================ //

    fn start(&mut self, now: Instant) -> Outcome {
        if self.state.current_step == WorkflowStep::Complete {
            self.cancel_timers();
            self.zero_readings();
            self.state = WorkflowRunState::default();
            self.restart_at = Some(now + self.settings.restart_delay);
            self.events.push(WorkflowEvent::RestartScheduled);
            return Outcome::Applied;
        }

        if self.state.is_running && self.state.current_step != WorkflowStep::Idle {
            return Outcome::Ignored;
        }

        // also drops a restart still pending from a previous start()
        self.cancel_timers();
        self.zero_readings();
        self.begin_run(now);
        Outcome::Applied
    }

    fn reset(&mut self) {
        self.cancel_timers();
        self.zero_readings();
        self.state = WorkflowRunState::default();
        self.run_id = None;
        self.events.push(WorkflowEvent::Reset);
    }

    fn advance(&mut self, now: Instant) -> Outcome {
        let Some(step) = self.state.current_step.successor() else {
            return Outcome::Ignored;
        };

        self.state.current_step = step;
        self.state.step_progress = 0;
        self.apply_step_targets(step, now);
        self.events.push(WorkflowEvent::StepEntered { step, manual: true });
        Outcome::Applied
    }

    // =============================== RUN LOOP =============================== //

    fn begin_run(&mut self, at: Instant) {
        let run_id = Uuid::new_v4();
        self.state.is_running = true;
        self.run_id = Some(run_id);
        self.events.push(WorkflowEvent::RunStarted { run_id });
        self.enter_step(0, at);
    }

    fn enter_step(&mut self, index: usize, at: Instant) {
        let Some(&step) = STEP_ORDER.get(index) else {
            return;
        };

        self.state.current_step = step;
        self.apply_step_targets(step, at);
        self.events.push(WorkflowEvent::StepEntered { step, manual: false });

        if step == WorkflowStep::Complete {
            self.state.step_progress = 100;
            self.progress = None;
            self.advance = None;
            if let Some(run_id) = self.run_id {
                self.events.push(WorkflowEvent::RunCompleted { run_id });
            }
            return;
        }

        self.state.step_progress = 0;
        self.progress = Some(ProgressTicker {
            value: 0,
            next_at: at + self.settings.progress_interval,
        });
        self.advance = Some(ScheduledAdvance {
            index: index + 1,
            at: at + self.settings.step_dwell,
        });
    }

    /// Merge the step's targets, start its transition and re-phase the
    /// fluctuation ticker
    fn apply_step_targets(&mut self, step: WorkflowStep, at: Instant) {
        let overrides = targets_for(step);
        overrides.apply_to(&mut self.targets);

        let mut animation = Animation::new(
            at,
            self.settings.animation_frames,
            self.settings.animation_frame_interval,
            overrides.declares_efficiency(),
        );
        animation.step(&mut self.state.sensor_data, &self.targets);
        self.animation = (!animation.is_finished()).then_some(animation);

        self.fluctuation_at = match step {
            WorkflowStep::Idle => None,
            _ => Some(at + self.settings.fluctuation_interval),
        };
    }

    // =============================== TIMERS ================================= //

    fn next_due(&self) -> Option<(Instant, Due)> {
        [
            self.restart_at.map(|at| (at, Due::Restart)),
            self.advance.map(|a| (a.at, Due::Advance)),
            self.progress.map(|p| (p.next_at, Due::Progress)),
            self.animation.as_ref().map(|a| (a.next_at(), Due::Animation)),
            self.fluctuation_at.map(|at| (at, Due::Fluctuation)),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn fire(&mut self, due: Due, at: Instant) {
        match due {
            Due::Restart => {
                self.restart_at = None;
                self.begin_run(at);
            }
            Due::Advance => {
                // the progress ticker never outlives its step
                self.progress = None;
                if let Some(advance) = self.advance.take() {
                    self.enter_step(advance.index, at);
                }
            }
            Due::Progress => {
                if let Some(mut ticker) = self.progress.take() {
                    ticker.value = ticker.value.saturating_add(self.settings.progress_increment);
                    self.state.step_progress = ticker.value.min(100);
                    if ticker.value < 100 {
                        ticker.next_at += self.settings.progress_interval;
                        self.progress = Some(ticker);
                    }
                }
            }
            Due::Animation => {
                if let Some(mut animation) = self.animation.take() {
                    if animation.step(&mut self.state.sensor_data, &self.targets) {
                        self.animation = Some(animation);
                    }
                }
            }
            Due::Fluctuation => {
                if self.state.current_step == WorkflowStep::Idle {
                    self.fluctuation_at = None;
                    return;
                }
                self.state.sensor_data = fluctuate(
                    self.state.current_step,
                    &self.state.sensor_data,
                    &self.targets,
                    &self.settings.noise,
                    &mut self.rng,
                );
                self.fluctuation_at = Some(at + self.settings.fluctuation_interval);
            }
        }
    }

    fn cancel_timers(&mut self) {
        self.restart_at = None;
        self.advance = None;
        self.progress = None;
        self.animation = None;
        self.fluctuation_at = None;
    }

    fn zero_readings(&mut self) {
        self.state.sensor_data = SensorData::ZERO;
        self.targets = SensorData::ZERO;
    }
}
