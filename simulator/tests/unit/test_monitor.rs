//! Monitor worker tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use solarflow::engine::{EngineSettings, WorkflowEngine};
use solarflow::models::workflow::WorkflowStep;
use solarflow::workers::{monitor, scheduler};
use tokio::sync::oneshot;

#[tokio::test(start_paused = true)]
async fn test_reports_keep_cadence_when_steps_change_faster() {
    let settings = EngineSettings {
        step_dwell: Duration::from_millis(800),
        ..Default::default()
    };
    let engine = Arc::new(WorkflowEngine::new(settings, Some(31)).unwrap());
    let report_timers = Arc::new(AtomicUsize::new(0));

    let (scheduler_stop_tx, scheduler_stop_rx) = oneshot::channel::<()>();
    let scheduler_engine = engine.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler::run(
            scheduler_engine.as_ref(),
            Box::pin(async move {
                let _ = scheduler_stop_rx.await;
            }),
        )
        .await;
    });

    let (monitor_stop_tx, monitor_stop_rx) = oneshot::channel::<()>();
    let monitor_engine = engine.clone();
    let timers = report_timers.clone();
    let monitor_handle = tokio::spawn(async move {
        let options = monitor::Options {
            report_interval: Duration::from_secs(1),
        };
        monitor::run(
            &options,
            monitor_engine.as_ref(),
            move |wait| {
                timers.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(wait)
            },
            Box::pin(async move {
                let _ = monitor_stop_rx.await;
            }),
        )
        .await;
    });

    // let the monitor subscribe before the run begins
    tokio::task::yield_now().await;
    engine.start();
    tokio::time::sleep(Duration::from_millis(3_990)).await;

    // step entries at 0, 800, 1600, 2400 and 3200 ms
    assert_eq!(engine.snapshot().current_step, WorkflowStep::Analytics);
    // the first timer plus one re-arm per report at 1, 2 and 3 s
    assert_eq!(report_timers.load(Ordering::SeqCst), 4);

    let _ = monitor_stop_tx.send(());
    let _ = scheduler_stop_tx.send(());
    monitor_handle.await.unwrap();
    scheduler_handle.await.unwrap();
}
