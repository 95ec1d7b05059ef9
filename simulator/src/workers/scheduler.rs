//! Scheduler worker driving the engine's clock

use std::future::Future;
use std::pin::Pin;

use tokio::time::Instant;
use tracing::{info, trace};

use crate::engine::WorkflowEngine;

/// Run the scheduler worker
///
/// Sleeps until the engine's next deadline, or until a control call changes
/// the schedule, then fires whatever is due. This is the only task that
/// advances simulated time.
pub async fn run(
    engine: &WorkflowEngine,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Scheduler worker starting...");

    loop {
        let deadline = engine.next_deadline();

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Scheduler worker shutting down...");
                return;
            }
            _ = engine.schedule_changed() => {
                trace!("Schedule changed, re-planning");
                continue;
            }
            _ = sleep_until(deadline) => {}
        }

        engine.tick(Instant::now());
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
