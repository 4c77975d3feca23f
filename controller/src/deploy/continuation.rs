//! Deadline-bounded execution with self re-invocation
//!
//! Work runs as its own task and races a deadline derived from the
//! invocation's execution budget. When the deadline wins, the work is
//! cancelled and the original payload is dispatched to a fresh invocation,
//! which restarts the whole reconciliation from its first query.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::deploy::watch::{cancel_pair, CancelSignal};
use crate::errors::ControllerError;
use crate::services::Invoker;

/// Time budget and continuation target for one invocation
#[derive(Debug, Clone)]
pub struct ContinuationOptions {
    /// Total execution time granted to an invocation
    pub execution_budget: Duration,

    /// Share of the budget spent on work before continuing elsewhere
    pub deadline_ratio: f64,

    /// How long cancelled work may take to stop
    pub cancel_grace: Duration,

    /// Function re-invoked with the original payload
    pub function: String,
}

impl ContinuationOptions {
    pub fn deadline(&self) -> Duration {
        self.execution_budget.mul_f64(self.deadline_ratio.clamp(0.0, 1.0))
    }

    pub fn with_function(&self, function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            ..self.clone()
        }
    }
}

impl Default for ContinuationOptions {
    fn default() -> Self {
        Self {
            execution_budget: Duration::from_secs(300),
            deadline_ratio: 0.9,
            cancel_grace: Duration::from_secs(5),
            function: "push".to_string(),
        }
    }
}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome<T> {
    /// The work finished within this invocation
    Finished(T),

    /// The work was handed to a new invocation
    Continued,
}

/// Run `work` until it finishes or the deadline measured from `started`
/// passes, whichever is first.
///
/// On deadline the work is cancelled and `payload` is dispatched unchanged
/// to `options.function`. Errors from finished work are returned as is.
pub async fn run_with_continuation<T, F, Fut>(
    options: &ContinuationOptions,
    invoker: &dyn Invoker,
    payload: &serde_json::Value,
    started: Instant,
    work: F,
) -> Result<RunOutcome<T>, ControllerError>
where
    F: FnOnce(CancelSignal) -> Fut,
    Fut: Future<Output = Result<T, ControllerError>> + Send + 'static,
    T: Send + 'static,
{
    let (handle, signal) = cancel_pair();
    let mut task = tokio::spawn(work(signal));
    let deadline = started + options.deadline();

    let joined = tokio::select! {
        joined = &mut task => Some(joined),
        _ = tokio::time::sleep_until(deadline) => None,
    };

    if let Some(joined) = joined {
        return flatten(joined).map(RunOutcome::Finished);
    }

    info!(
        deadline_secs = options.deadline().as_secs_f64(),
        "Execution deadline reached, cancelling work"
    );
    handle.cancel();

    match tokio::time::timeout(options.cancel_grace, &mut task).await {
        Ok(joined) => match flatten(joined) {
            Ok(value) => {
                info!("Work finished while stopping");
                return Ok(RunOutcome::Finished(value));
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => return Err(e),
        },
        Err(_) => {
            warn!("Work did not stop within the grace period, aborting it");
            task.abort();
        }
    }

    invoker.invoke(&options.function, payload).await?;
    info!(function = %options.function, "Work continued in a new invocation");
    Ok(RunOutcome::Continued)
}

fn flatten<T>(joined: Result<Result<T, ControllerError>, JoinError>) -> Result<T, ControllerError> {
    joined.map_err(|e| ControllerError::Internal(format!("Work task failed: {}", e)))?
}
