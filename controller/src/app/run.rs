//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::ControllerError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::dispatcher::{self, Job};

/// Run the pipewright controller
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ControllerError> {
    info!("Initializing pipewright controller...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start controller: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), ControllerError> {
    let app_state = AppState::init(options)?;
    let (jobs_tx, jobs_rx) = mpsc::channel::<Job>(options.dispatcher.queue_capacity);

    init_dispatcher_worker(
        options.dispatcher.clone(),
        app_state.processors.clone(),
        jobs_rx,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    let server_state = ServerState::new(
        jobs_tx,
        app_state.services.secrets.clone(),
        options.secrets.hmac_key.clone(),
        options.secrets.invoke_key.clone(),
    );
    init_server(options, Arc::new(server_state), shutdown_manager, shutdown_tx.subscribe()).await
}

fn init_dispatcher_worker(
    options: dispatcher::Options,
    processors: Arc<dispatcher::Processors>,
    jobs: mpsc::Receiver<Job>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ControllerError> {
    info!("Initializing dispatcher worker...");

    let dispatcher_handle = tokio::spawn(async move {
        dispatcher::run(
            &options,
            processors,
            jobs,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_dispatcher_worker_handle(dispatcher_handle)
}

async fn init_server(
    options: &AppOptions,
    state: Arc<ServerState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ControllerError> {
    info!("Initializing HTTP server...");

    let server_handle = serve(&options.server, state, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    server_handle: Option<JoinHandle<Result<(), ControllerError>>>,
    dispatcher_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            server_handle: None,
            dispatcher_worker_handle: None,
        }
    }

    pub fn with_dispatcher_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), ControllerError> {
        if self.dispatcher_worker_handle.is_some() {
            return Err(ControllerError::ShutdownError(
                "dispatcher_handle already set".to_string(),
            ));
        }
        self.dispatcher_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), ControllerError>>,
    ) -> Result<(), ControllerError> {
        if self.server_handle.is_some() {
            return Err(ControllerError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ControllerError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ControllerError> {
        info!("Shutting down pipewright controller...");

        // 1. Stop accepting work
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| ControllerError::ShutdownError(e.to_string()))??;
        }

        // 2. Drain in-flight jobs
        if let Some(handle) = self.dispatcher_worker_handle.take() {
            handle
                .await
                .map_err(|e| ControllerError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
