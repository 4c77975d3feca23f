//! Stack reconciliation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::deploy::fsm::{plan, DesiredState, ReconcileAction};
use crate::deploy::watch::{watch, CancelSignal, WatchOptions};
use crate::errors::ControllerError;
use crate::models::build::BuildContext;
use crate::services::StackManager;

/// Target state for one stack
#[derive(Debug, Clone)]
pub enum DesiredStack {
    /// The stack should not exist
    Absent,

    /// The stack should run the given template with its enriched parameters
    Present(BuildContext),
}

impl DesiredStack {
    fn state(&self) -> DesiredState {
        match self {
            DesiredStack::Absent => DesiredState::Absent,
            DesiredStack::Present(_) => DesiredState::Present,
        }
    }
}

/// What a reconciliation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    NothingToDelete,
    DeleteRequested,
    Created,
    Updated { build_started: bool },
    Watched { build_started: bool },
}

/// Drives a stack towards its desired state and waits for the result
pub struct Reconciler {
    stacks: Arc<dyn StackManager>,
    watch_options: WatchOptions,
}

impl Reconciler {
    pub fn new(stacks: Arc<dyn StackManager>, watch_options: WatchOptions) -> Self {
        Self {
            stacks,
            watch_options,
        }
    }

    /// Reconcile `stack` against `desired`.
    ///
    /// Safe to repeat: a stack with an operation already running is only
    /// watched, never mutated a second time.
    pub async fn reconcile(
        &self,
        stack: &str,
        desired: &DesiredStack,
        cancel: &mut CancelSignal,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let current = self.stacks.status(stack).await?;
        let action = plan(desired.state(), &current);
        info!(stack, status = %current, ?action, "Reconciling stack");

        match (action, desired) {
            (ReconcileAction::Skip, _) => {
                info!(stack, "Stack does not exist, nothing to delete");
                Ok(ReconcileOutcome::NothingToDelete)
            }
            (ReconcileAction::Delete, _) => {
                self.stacks.delete(stack).await?;
                info!(stack, "Stack deletion requested");
                Ok(ReconcileOutcome::DeleteRequested)
            }
            (ReconcileAction::Create, DesiredStack::Present(context)) => {
                self.stacks
                    .create(stack, &context.parameters, &context.pipeline_template)
                    .await?;
                info!(stack, "Stack creation requested");

                // Creation starts the pipeline by itself
                watch(stack, self.stacks.as_ref(), &self.watch_options, cancel).await?;
                Ok(ReconcileOutcome::Created)
            }
            (ReconcileAction::Update, DesiredStack::Present(context)) => {
                let before = self.stacks.last_updated(stack).await?;
                self.stacks
                    .update(stack, &context.parameters, &context.pipeline_template)
                    .await?;
                info!(stack, "Stack update requested");

                watch(stack, self.stacks.as_ref(), &self.watch_options, cancel).await?;
                let build_started = self.start_build_if_updated(stack, before).await?;
                Ok(ReconcileOutcome::Updated { build_started })
            }
            (ReconcileAction::Watch, _) => {
                info!(stack, status = %current, "Stack operation already running, watching it");
                watch(stack, self.stacks.as_ref(), &self.watch_options, cancel).await?;
                let build_started = self.start_build_if_updated(stack, None).await?;
                Ok(ReconcileOutcome::Watched { build_started })
            }
            (action, DesiredStack::Absent) => Err(ControllerError::Internal(format!(
                "{:?} planned for a stack that should be absent",
                action
            ))),
        }
    }

    /// Start the pipeline when the stack was updated after `before`.
    ///
    /// A stack that was only ever created has no update time; creation
    /// already started its pipeline.
    async fn start_build_if_updated(
        &self,
        stack: &str,
        before: Option<DateTime<Utc>>,
    ) -> Result<bool, ControllerError> {
        let after = self.stacks.last_updated(stack).await?;
        let updated = match (before, after) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(before), Some(after)) => after > before,
        };

        if !updated {
            info!(stack, "Stack not updated, pipeline not started");
            return Ok(false);
        }

        info!(stack, "Starting pipeline");
        self.stacks.start_build(stack).await?;
        Ok(true)
    }
}
