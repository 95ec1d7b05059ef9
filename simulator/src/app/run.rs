//! Main application run loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::engine::{WorkflowEngine, WorkflowRunState};
use crate::errors::SimulatorError;
use crate::models::workflow::WorkflowStep;
use crate::workers::{console, monitor, scheduler};

/// Run the simulator until a shutdown condition is met
///
/// Returns the last published state.
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<WorkflowRunState, SimulatorError> {
    info!("Initializing solarflow simulator...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager =
        ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());
    let quit = Arc::new(Notify::new());

    let engine = match init(&options, quit.clone(), &shutdown_tx, &mut shutdown_manager) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start simulator: {}", e);
            shutdown_manager.shutdown().await?;
            return Err(e);
        }
    };

    if options.autostart {
        engine.start();
    } else if !options.interactive {
        warn!("Autostart and console are both disabled, nothing will drive the workflow");
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
        _ = quit.notified() => {
            info!("Quit requested, shutting down...");
        }
        _ = await_completion(&engine), if options.lifecycle.exit_on_complete => {
            info!("Workflow complete, shutting down...");
        }
        _ = await_max_runtime(options.lifecycle.max_runtime) => {
            info!("Max runtime ({:?}) reached, shutting down...", options.lifecycle.max_runtime);
        }
    }

    let final_state = engine.snapshot();

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await?;
    Ok(final_state)
}

async fn await_completion(engine: &WorkflowEngine) {
    let mut state_rx = engine.subscribe();
    if state_rx
        .wait_for(|state| state.current_step == WorkflowStep::Complete)
        .await
        .is_err()
    {
        std::future::pending::<()>().await;
    }
}

async fn await_max_runtime(max_runtime: Option<Duration>) {
    match max_runtime {
        Some(max_runtime) => tokio::time::sleep(max_runtime).await,
        None => std::future::pending().await,
    }
}

// =============================== INITIALIZATION ================================== //

fn init(
    options: &AppOptions,
    quit: Arc<Notify>,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<WorkflowEngine>, SimulatorError> {
    let engine = Arc::new(WorkflowEngine::new(options.engine.clone(), options.seed)?);

    init_scheduler_worker(engine.clone(), shutdown_manager, shutdown_tx.subscribe())?;

    if options.enable_monitor {
        init_monitor_worker(
            options.monitor.clone(),
            engine.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    if options.interactive {
        init_console_worker(engine.clone(), quit, shutdown_manager, shutdown_tx.subscribe())?;
    }

    Ok(engine)
}

fn init_scheduler_worker(
    engine: Arc<WorkflowEngine>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SimulatorError> {
    info!("Initializing scheduler worker...");

    let scheduler_handle = tokio::spawn(async move {
        scheduler::run(
            engine.as_ref(),
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_scheduler_worker_handle(scheduler_handle)
}

fn init_monitor_worker(
    options: monitor::Options,
    engine: Arc<WorkflowEngine>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SimulatorError> {
    info!("Initializing monitor worker...");

    let monitor_handle = tokio::spawn(async move {
        monitor::run(
            &options,
            engine.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_monitor_worker_handle(monitor_handle)
}

fn init_console_worker(
    engine: Arc<WorkflowEngine>,
    quit: Arc<Notify>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SimulatorError> {
    info!("Initializing console worker...");

    let console_handle = tokio::spawn(async move {
        console::run(
            engine.as_ref(),
            BufReader::new(tokio::io::stdin()),
            quit.as_ref(),
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_console_worker_handle(console_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    scheduler_worker_handle: Option<JoinHandle<()>>,
    monitor_worker_handle: Option<JoinHandle<()>>,
    console_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            scheduler_worker_handle: None,
            monitor_worker_handle: None,
            console_worker_handle: None,
        }
    }

    fn with_scheduler_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), SimulatorError> {
        if self.scheduler_worker_handle.is_some() {
            return Err(SimulatorError::ShutdownError("scheduler_handle already set".to_string()));
        }
        self.scheduler_worker_handle = Some(handle);
        Ok(())
    }

    fn with_monitor_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), SimulatorError> {
        if self.monitor_worker_handle.is_some() {
            return Err(SimulatorError::ShutdownError("monitor_handle already set".to_string()));
        }
        self.monitor_worker_handle = Some(handle);
        Ok(())
    }

    fn with_console_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), SimulatorError> {
        if self.console_worker_handle.is_some() {
            return Err(SimulatorError::ShutdownError("console_handle already set".to_string()));
        }
        self.console_worker_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), SimulatorError> {
        let _ = self.shutdown_tx.send(());

        let max_delay = self.lifecycle_options.max_shutdown_delay;
        match tokio::time::timeout(max_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => Err(SimulatorError::ShutdownError(format!(
                "Shutdown timed out after {:?}",
                max_delay
            ))),
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), SimulatorError> {
        info!("Shutting down solarflow simulator...");

        // 1. Console worker, so no control lands after the clock stops
        if let Some(handle) = self.console_worker_handle.take() {
            handle.await.map_err(|e| SimulatorError::ShutdownError(e.to_string()))?;
        }

        // 2. Monitor worker
        if let Some(handle) = self.monitor_worker_handle.take() {
            handle.await.map_err(|e| SimulatorError::ShutdownError(e.to_string()))?;
        }

        // 3. Scheduler worker
        if let Some(handle) = self.scheduler_worker_handle.take() {
            handle.await.map_err(|e| SimulatorError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
