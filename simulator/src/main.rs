//! Solarflow - Entry Point
//!
//! Simulates a solar-powered monitoring pipeline moving from sunlight capture
//! to analytics, with live sensor readings easing toward each stage.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use solarflow::app::options::{AppOptions, LifecycleOptions};
use solarflow::app::run::run;
use solarflow::engine::EngineSettings;
use solarflow::errors::SimulatorError;
use solarflow::filesys::file::File;
use solarflow::logs::{init_logging, LogLevel, LogOptions};
use solarflow::storage::settings::{load_settings, Settings};
use solarflow::utils::version_info;
use solarflow::workers::monitor;

use tracing::{error, info};

const DEFAULT_SETTINGS_FILE: &str = "solarflow.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize version info: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    // Retrieve the settings file
    let settings_path = cli_args
        .get("settings")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SETTINGS_FILE);
    let settings = match load_settings(&File::new(settings_path)).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {settings_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings = match apply_cli_overrides(settings, &cli_args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid arguments: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Dump the effective settings and exit
    if let Some(path) = cli_args.get("write-settings") {
        return match File::new(path).write_json(&settings).await {
            Ok(()) => {
                println!("Settings written to {path}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to write settings to {path}: {e}");
                ExitCode::FAILURE
            }
        };
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log.json,
        log_dir: settings.log.dir.as_ref().map(PathBuf::from),
        ..Default::default()
    };
    let log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run the simulator
    let options = AppOptions {
        lifecycle: LifecycleOptions {
            // the operator drives an interactive session and quits explicitly
            exit_on_complete: settings.exit_on_complete && !settings.interactive,
            ..Default::default()
        },
        engine: EngineSettings::from(&settings.simulation),
        seed: settings.simulation.seed,
        autostart: settings.autostart,
        enable_monitor: settings.monitor.enabled,
        monitor: monitor::Options {
            report_interval: Duration::from_millis(settings.monitor.report_interval_ms),
        },
        interactive: settings.interactive,
    };

    info!(
        version = %version.version,
        git_hash = %version.git_hash,
        "Running solarflow with options: {:?}",
        options
    );
    let succeeded = match run(options, await_shutdown_signal()).await {
        Ok(state) => {
            info!(
                "Stopped at {} ({}% of step)",
                state.current_step.label(),
                state.step_progress
            );
            true
        }
        Err(e) => {
            error!("Failed to run the simulator: {e}");
            false
        }
    };

    // The console's stdin reader sits on a blocking thread the runtime would
    // otherwise wait on.
    if settings.interactive {
        drop(log_guard);
        std::process::exit(if succeeded { 0 } else { 1 });
    }
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn apply_cli_overrides(
    mut settings: Settings,
    cli_args: &HashMap<String, String>,
) -> Result<Settings, SimulatorError> {
    if let Some(level) = cli_args.get("log-level") {
        settings.log_level = level.parse::<LogLevel>()?;
    }
    if let Some(seed) = cli_args.get("seed") {
        let seed = seed
            .parse::<u64>()
            .map_err(|_| SimulatorError::ValidationError(format!("Invalid seed: {}", seed)))?;
        settings.simulation.seed = Some(seed);
    }
    if cli_args.contains_key("interactive") {
        settings.interactive = true;
    }
    if cli_args.contains_key("no-autostart") {
        settings.autostart = false;
    }
    if cli_args.contains_key("log-json") {
        settings.log.json = true;
    }
    Ok(settings)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to install signal handlers: {}", e);
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Ctrl+C received, shutting down...");
                    }
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, shutting down..."),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    }
}
