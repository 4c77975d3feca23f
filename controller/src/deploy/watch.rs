//! Stack status watching

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::deploy::status::{StackPhase, StackStatus};
use crate::errors::ControllerError;
use crate::services::StackManager;

/// Watch loop options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Delay between status polls
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Sending half of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half of a cancellation signal, checked between polls
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Sleep one poll interval, waking early on cancellation
async fn pause(options: &WatchOptions, cancel: &mut CancelSignal) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(options.poll_interval) => {}
    }
}

/// Poll a stack until its operation completes.
///
/// Returns the completed status, `StackFailed` as soon as a failed or
/// rolled-back status is seen, or `Cancelled` when the signal fires.
pub async fn watch(
    stack: &str,
    stacks: &dyn StackManager,
    options: &WatchOptions,
    cancel: &mut CancelSignal,
) -> Result<StackStatus, ControllerError> {
    loop {
        if cancel.is_cancelled() {
            info!(stack, "Stack watch received stop signal");
            return Err(ControllerError::Cancelled(stack.to_string()));
        }

        let status = stacks.status(stack).await?;
        match status.phase() {
            StackPhase::Complete => {
                info!(stack, status = %status, "Stack operation complete");
                return Ok(status);
            }
            StackPhase::Failed | StackPhase::RolledBack => {
                warn!(stack, status = %status, "Stack operation failed");
                return Err(ControllerError::StackFailed {
                    stack: stack.to_string(),
                    status: status.raw,
                });
            }
            StackPhase::InProgress => {
                debug!(stack, status = %status, "Stack operation in progress");
                pause(options, cancel).await;
            }
        }
    }
}

/// Poll a stack until it no longer exists
pub async fn watch_deletion(
    stack: &str,
    stacks: &dyn StackManager,
    options: &WatchOptions,
    cancel: &mut CancelSignal,
) -> Result<(), ControllerError> {
    loop {
        if cancel.is_cancelled() {
            info!(stack, "Deletion watch received stop signal");
            return Err(ControllerError::Cancelled(stack.to_string()));
        }

        let status = stacks.status(stack).await?;
        if status.is_gone() {
            info!(stack, "Stack deleted");
            return Ok(());
        }

        if status.phase().is_failure() {
            warn!(stack, status = %status, "Stack deletion failed");
            return Err(ControllerError::StackFailed {
                stack: stack.to_string(),
                status: status.raw,
            });
        }

        debug!(stack, status = %status, "Stack deletion in progress");
        pause(options, cancel).await;
    }
}
