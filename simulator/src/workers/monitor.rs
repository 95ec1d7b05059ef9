//! Monitor worker logging the simulation as it unfolds

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::engine::{WorkflowEngine, WorkflowEvent, WorkflowRunState};
use crate::models::workflow::active_components;

/// Monitor worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Interval between periodic reading reports
    pub report_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            report_interval: Duration::from_secs(1),
        }
    }
}

/// Compact one-line rendering of the readings, as on the LCD
pub fn format_readings(state: &WorkflowRunState) -> String {
    let data = &state.sensor_data;
    format!(
        "{:.0} lux | {:.2} V | {:.2} A | {:.2} W | {:.1}%",
        data.light_intensity, data.voltage, data.current, data.power, data.efficiency
    )
}

/// Run the monitor worker
pub async fn run<S, F>(
    options: &Options,
    engine: &WorkflowEngine,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Monitor worker starting...");

    let mut events = engine.events();
    // re-armed only when it fires, never by incoming events
    let mut report = Box::pin(sleep_fn(options.report_interval));

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Monitor worker shutting down...");
                return;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event, &engine.snapshot()),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Monitor fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => {
                    info!("Engine event stream closed, monitor stopping...");
                    return;
                }
            },
            _ = &mut report => {
                report.set(sleep_fn(options.report_interval));
                let state = engine.snapshot();
                if !state.is_idle() {
                    info!(
                        step = %state.current_step,
                        progress = state.step_progress,
                        "{}",
                        format_readings(&state)
                    );
                }
            }
        }
    }
}

fn log_event(event: &WorkflowEvent, state: &WorkflowRunState) {
    match event {
        WorkflowEvent::StepEntered { step, manual } => {
            let info = step.info();
            info!(
                step = %step,
                manual = *manual,
                "{}: {}",
                step.label(),
                info.description
            );
            for detail in info.details {
                debug!("  - {}", detail);
            }
            let components: Vec<&str> = active_components(*step)
                .into_iter()
                .map(|c| c.label())
                .collect();
            debug!("Active components: {}", components.join(", "));
        }
        WorkflowEvent::RunCompleted { run_id } => {
            let breakdown = state.sensor_data.power_breakdown();
            info!(
                %run_id,
                "Run complete: {} (output {:.1} W, loss {:.1} W, daily {:.0} Wh)",
                format_readings(state),
                breakdown.output,
                breakdown.loss,
                breakdown.daily_energy
            );
        }
        // already logged by the engine
        WorkflowEvent::RunStarted { .. }
        | WorkflowEvent::RestartScheduled
        | WorkflowEvent::Reset => {}
    }
}
