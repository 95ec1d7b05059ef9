//! Application configuration options

use std::time::Duration;

use crate::engine::EngineSettings;
use crate::workers::monitor;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Engine timing and noise
    pub engine: EngineSettings,

    /// Fixed noise seed; drawn from the OS when absent
    pub seed: Option<u64>,

    /// Start a run once the workers are up
    pub autostart: bool,

    /// Enable the monitor worker
    pub enable_monitor: bool,

    /// Monitor worker options
    pub monitor: monitor::Options,

    /// Enable the stdin console worker
    pub interactive: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            engine: EngineSettings::default(),
            seed: None,
            autostart: true,
            enable_monitor: true,
            monitor: monitor::Options::default(),
            interactive: false,
        }
    }
}

/// Lifecycle options for the simulator
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Shut down once the workflow reaches `complete`
    pub exit_on_complete: bool,

    /// Maximum runtime before shutdown
    pub max_runtime: Option<Duration>,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            exit_on_complete: true,
            max_runtime: None,
            max_shutdown_delay: Duration::from_secs(5),
        }
    }
}
