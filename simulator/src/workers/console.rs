//! Interactive console driving the engine from line-based input

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::engine::{WorkflowEngine, WorkflowRunState};
use crate::errors::SimulatorError;
use crate::workers::monitor::format_readings;

const HELP: &str = "commands: start | reset | next | progress <0-100> | status | help | quit";

/// A console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Next,
    Progress(u8),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let command = match (name.as_str(), arg) {
            ("start", None) => Command::Start,
            ("reset", None) => Command::Reset,
            ("next" | "advance", None) => Command::Next,
            ("progress", Some(value)) => {
                let progress: u8 = value.parse().map_err(|_| {
                    SimulatorError::ValidationError(format!("Invalid progress: {}", value))
                })?;
                if progress > 100 {
                    return Err(SimulatorError::ValidationError(format!(
                        "Progress must be within 0-100, got {}",
                        progress
                    )));
                }
                Command::Progress(progress)
            }
            ("status", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            _ => {
                return Err(SimulatorError::ValidationError(format!(
                    "Unknown command: {}",
                    s.trim()
                )))
            }
        };

        if parts.next().is_some() {
            return Err(SimulatorError::ValidationError(format!(
                "Unexpected arguments: {}",
                s.trim()
            )));
        }
        Ok(command)
    }
}

/// Coloured one-line rendering of a snapshot
pub fn render_status(state: &WorkflowRunState) -> String {
    const BAR_WIDTH: usize = 20;

    let badge = if state.is_running {
        "RUNNING".green().bold()
    } else {
        "READY".dimmed()
    };
    let filled = usize::from(state.step_progress) * BAR_WIDTH / 100;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    let breakdown = state.sensor_data.power_breakdown();

    format!(
        "[{}] {} [{}] {:>3}% | {} | out {:.1} W loss {:.1} W daily {:.0} Wh",
        badge,
        state.current_step.label().cyan().bold(),
        bar,
        state.step_progress,
        format_readings(state),
        breakdown.output,
        breakdown.loss,
        breakdown.daily_energy,
    )
}

/// Apply a command to the engine
///
/// Returns `false` when the console should stop.
pub fn dispatch(engine: &WorkflowEngine, command: Command) -> bool {
    match command {
        Command::Start => engine.start(),
        Command::Reset => engine.reset(),
        Command::Next => engine.advance(),
        Command::Progress(progress) => engine.set_step_progress(progress),
        Command::Status => println!("{}", render_status(&engine.snapshot())),
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

/// Run the console worker
///
/// `quit` is notified when the user asks to leave; end of input only stops
/// the console itself.
pub async fn run<R>(
    engine: &WorkflowEngine,
    input: R,
    quit: &Notify,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    R: AsyncBufRead + Unpin,
{
    info!("Console worker starting...");
    println!("{}", HELP);

    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Console worker shutting down...");
                return;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Console input closed");
                return;
            }
            Err(e) => {
                error!("Failed to read console input: {}", e);
                return;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if !dispatch(engine, command) {
                    info!("Quit requested from console");
                    quit.notify_one();
                    return;
                }
            }
            Err(e) => {
                warn!("{}", e);
                println!("{}", HELP);
            }
        }
    }
}
