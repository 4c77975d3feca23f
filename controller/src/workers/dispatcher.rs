//! Job dispatcher worker
//!
//! Each accepted job runs as its own task, independent of every other job,
//! the way a fresh invocation would.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::cleaner::StackCleaner;
use crate::deploy::batch::handle_batch;
use crate::deploy::executor::PushExecutor;
use crate::models::{CustomResourceEvent, PipelineStageEvent, PushEvent, QueueBatch};
use crate::notifier::PipelineNotifier;

/// Unit of work accepted by the service
#[derive(Debug, Clone)]
pub enum Job {
    /// Queue batch of webhook deliveries
    Batch(QueueBatch),

    /// Continuation of a push event
    Push(PushEvent),

    /// Custom resource request, first delivery or continuation
    Cleanup(CustomResourceEvent),

    /// Pipeline stage change
    Notify(PipelineStageEvent),
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Batch(_) => "batch",
            Job::Push(_) => "push",
            Job::Cleanup(_) => "cleanup",
            Job::Notify(_) => "notify",
        }
    }
}

/// Job submission handle
pub type JobSender = mpsc::Sender<Job>;

/// Processors jobs are routed to
pub struct Processors {
    pub executor: PushExecutor,
    pub cleaner: StackCleaner,
    pub notifier: PipelineNotifier,
}

impl Processors {
    /// Run one job to completion, timing its budget from now
    pub async fn dispatch(&self, job: Job) {
        let started = Instant::now();
        let kind = job.kind();

        match job {
            Job::Batch(batch) => {
                handle_batch(&self.executor, batch, started).await;
            }
            Job::Push(event) => {
                if let Err(e) = self.executor.process(event, started).await {
                    error!(job = kind, error = %e, "Push continuation failed");
                }
            }
            Job::Cleanup(event) => {
                if let Err(e) = self.cleaner.process(event, started).await {
                    error!(job = kind, error = %e, "Stack cleanup failed");
                }
            }
            Job::Notify(event) => {
                if let Err(e) = self.notifier.process(event).await {
                    error!(job = kind, error = %e, "Pipeline notification failed");
                }
            }
        }
    }
}

/// Dispatcher worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Channel capacity for pending jobs
    pub queue_capacity: usize,

    /// How long in-flight jobs may run after shutdown is requested
    pub drain_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Run the dispatcher worker
pub async fn run(
    options: &Options,
    processors: Arc<Processors>,
    mut jobs: mpsc::Receiver<Job>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Dispatcher worker starting...");
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Dispatcher worker shutting down...");
                break;
            }
            job = jobs.recv() => {
                let Some(job) = job else {
                    info!("Job channel closed, dispatcher worker stopping...");
                    break;
                };
                info!(job = job.kind(), "Dispatching job");
                let processors = processors.clone();
                tasks.spawn(async move { processors.dispatch(job).await });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    error!("Job task failed: {}", e);
                }
            }
        }
    }

    jobs.close();
    let mut dropped = 0usize;
    while jobs.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        warn!(dropped, "Discarded queued jobs that never started");
    }

    drain(options, &mut tasks).await;
}

async fn drain(options: &Options, tasks: &mut JoinSet<()>) {
    if tasks.is_empty() {
        return;
    }

    info!(in_flight = tasks.len(), "Waiting for in-flight jobs...");
    let drained = tokio::time::timeout(options.drain_timeout, async {
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Job task failed: {}", e);
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!(
            "In-flight jobs did not finish within {:?}, aborting them",
            options.drain_timeout
        );
        tasks.abort_all();
    }
}
