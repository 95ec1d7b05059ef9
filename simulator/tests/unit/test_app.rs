//! Application run loop tests

use std::time::Duration;

use solarflow::app::options::{AppOptions, LifecycleOptions};
use solarflow::app::run::run;
use solarflow::models::workflow::WorkflowStep;

fn options() -> AppOptions {
    AppOptions {
        seed: Some(21),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_exits_on_complete() {
    let started = tokio::time::Instant::now();

    let state = run(options(), std::future::pending::<()>()).await.unwrap();

    assert_eq!(state.current_step, WorkflowStep::Complete);
    assert_eq!(state.step_progress, 100);
    // five dwells, then shutdown without waiting on further timers
    assert!(started.elapsed() >= Duration::from_millis(12_500));
    assert!(started.elapsed() < Duration::from_millis(13_000));
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_shutdown_signal() {
    let signal = tokio::time::sleep(Duration::from_millis(3_210));

    let state = run(options(), signal).await.unwrap();

    assert_eq!(state.current_step, WorkflowStep::Sensors);
    assert!(state.is_running);
}

#[tokio::test(start_paused = true)]
async fn test_run_without_autostart_stays_idle_until_max_runtime() {
    let options = AppOptions {
        autostart: false,
        enable_monitor: false,
        lifecycle: LifecycleOptions {
            exit_on_complete: false,
            max_runtime: Some(Duration::from_secs(4)),
            ..Default::default()
        },
        ..options()
    };

    let state = run(options, std::future::pending::<()>()).await.unwrap();

    assert!(state.is_idle());
    assert!(!state.is_running);
}
