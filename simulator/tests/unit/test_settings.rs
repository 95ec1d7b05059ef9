//! Settings file tests

use std::path::PathBuf;

use solarflow::errors::SimulatorError;
use solarflow::filesys::file::File;
use solarflow::logs::LogLevel;
use solarflow::storage::settings::{load_settings, Settings};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("solarflow-test-{}", uuid::Uuid::new_v4()))
        .join(name)
}

#[tokio::test]
async fn test_missing_file_yields_defaults() {
    let file = File::new(temp_path("absent.json"));
    let settings = load_settings(&file).await.unwrap();
    assert_eq!(settings, Settings::default());
}

#[tokio::test]
async fn test_written_settings_load_back() {
    let file = File::new(temp_path("settings.json"));
    let mut settings = Settings::default();
    settings.log_level = LogLevel::Warn;
    settings.simulation.step_dwell_ms = 4_000;
    settings.simulation.seed = Some(42);
    settings.monitor.enabled = false;

    file.write_json(&settings).await.unwrap();
    let loaded = load_settings(&file).await.unwrap();

    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_zero_cadence_is_rejected() {
    let file = File::new(temp_path("zero.json"));
    let mut settings = Settings::default();
    settings.simulation.progress_interval_ms = 0;
    file.write_json(&settings).await.unwrap();

    let result = load_settings(&file).await;
    assert!(matches!(result, Err(SimulatorError::ConfigError(_))));
}

#[tokio::test]
async fn test_malformed_file_is_a_json_error() {
    let path = temp_path("broken.json");
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, "{ not json").await.unwrap();
    let file = File::new(&path);

    let result = load_settings(&file).await;
    assert!(matches!(result, Err(SimulatorError::JsonError(_))));
}

#[tokio::test]
async fn test_zero_report_interval_is_rejected() {
    let file = File::new(temp_path("monitor.json"));
    let mut settings = Settings::default();
    settings.monitor.report_interval_ms = 0;
    file.write_json(&settings).await.unwrap();

    let result = load_settings(&file).await;
    assert!(matches!(result, Err(SimulatorError::ConfigError(_))));
}
