//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::fluctuation::NoiseAmplitudes;
use crate::engine::EngineSettings;
use crate::errors::SimulatorError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Simulator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log output configuration
    #[serde(default)]
    pub log: LogSettings,

    /// Simulation timing and noise
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Start a run as soon as the simulator is up
    #[serde(default = "default_true")]
    pub autostart: bool,

    /// Shut down once a run reaches `complete`
    #[serde(default = "default_true")]
    pub exit_on_complete: bool,

    /// Read control commands from stdin
    #[serde(default)]
    pub interactive: bool,

    /// Monitor consumer configuration
    #[serde(default)]
    pub monitor: MonitorSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log: LogSettings::default(),
            simulation: SimulationSettings::default(),
            autostart: true,
            exit_on_complete: true,
            interactive: false,
            monitor: MonitorSettings::default(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rolling log files; stdout only when absent
    #[serde(default)]
    pub dir: Option<String>,
}

/// Simulation settings, durations in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub step_dwell_ms: u64,
    pub progress_interval_ms: u64,
    pub progress_increment: u8,
    pub animation_frames: u32,
    pub animation_frame_ms: u64,
    pub fluctuation_interval_ms: u64,
    pub restart_delay_ms: u64,
    pub noise: NoiseAmplitudes,

    /// Fixed seed for reproducible noise
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for SimulationSettings {
    fn from(engine: &EngineSettings) -> Self {
        Self {
            step_dwell_ms: millis(engine.step_dwell),
            progress_interval_ms: millis(engine.progress_interval),
            progress_increment: engine.progress_increment,
            animation_frames: engine.animation_frames,
            animation_frame_ms: millis(engine.animation_frame_interval),
            fluctuation_interval_ms: millis(engine.fluctuation_interval),
            restart_delay_ms: millis(engine.restart_delay),
            noise: engine.noise,
            seed: None,
        }
    }
}

/// Whole milliseconds of `duration`, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<&SimulationSettings> for EngineSettings {
    fn from(settings: &SimulationSettings) -> Self {
        Self {
            step_dwell: Duration::from_millis(settings.step_dwell_ms),
            progress_interval: Duration::from_millis(settings.progress_interval_ms),
            progress_increment: settings.progress_increment,
            animation_frames: settings.animation_frames,
            animation_frame_interval: Duration::from_millis(settings.animation_frame_ms),
            fluctuation_interval: Duration::from_millis(settings.fluctuation_interval_ms),
            restart_delay: Duration::from_millis(settings.restart_delay_ms),
            noise: settings.noise,
        }
    }
}

/// Monitor consumer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_report_interval")]
    pub report_interval_ms: u64,
}

fn default_report_interval() -> u64 {
    1000
}

impl MonitorSettings {
    /// Reject a zero report cadence on an enabled monitor
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if self.enabled && self.report_interval_ms == 0 {
            return Err(SimulatorError::ConfigError(
                "report_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            report_interval_ms: default_report_interval(),
        }
    }
}

/// Load settings from `file`, falling back to defaults when it does not exist
pub async fn load_settings(file: &File) -> Result<Settings, SimulatorError> {
    if !file.exists().await {
        info!("No settings file at {}, using defaults", file.path().display());
        return Ok(Settings::default());
    }
    let settings: Settings = file.read_json().await?;
    EngineSettings::from(&settings.simulation).validate()?;
    settings.monitor.validate()?;
    Ok(settings)
}
