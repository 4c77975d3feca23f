//! Stack cleanup for custom resource deletion

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info, info_span, Instrument};

use crate::deploy::continuation::{run_with_continuation, ContinuationOptions, RunOutcome};
use crate::deploy::watch::{watch_deletion, CancelSignal, WatchOptions};
use crate::errors::ControllerError;
use crate::models::{CustomResourceEvent, CustomResourceResponse, RequestType, ResponseStatus};
use crate::services::{Services, StackManager};

/// Resource property naming the stack to remove
pub const STACK_PROPERTY: &str = "Stack";

#[derive(Debug, Clone)]
pub struct CleanerOptions {
    pub continuation: ContinuationOptions,
    pub watch: WatchOptions,

    /// Reported as the physical id on success and the reason on failure
    pub log_location: String,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            continuation: ContinuationOptions::default().with_function("cleanup"),
            watch: WatchOptions::default(),
            log_location: "pipewright/cleanup".to_string(),
        }
    }
}

/// Delete a stack and wait until it is gone
pub async fn delete_stack(
    stack: &str,
    stacks: &dyn StackManager,
    options: &WatchOptions,
    cancel: &mut CancelSignal,
) -> Result<(), ControllerError> {
    let status = stacks.status(stack).await?;
    if status.is_gone() {
        info!(stack, "Stack not found, cleanup complete");
        return Ok(());
    }

    if status.is_settled() {
        stacks.delete(stack).await?;
        info!(stack, "Stack deletion requested");
    } else {
        info!(stack, status = %status, "Stack operation in progress, waiting for deletion");
    }

    watch_deletion(stack, stacks, options, cancel).await
}

/// Removes the stack named by a custom resource when that resource is deleted
pub struct StackCleaner {
    services: Services,
    options: CleanerOptions,
}

impl StackCleaner {
    pub fn new(services: Services, options: CleanerOptions) -> Self {
        Self { services, options }
    }

    pub async fn process(
        &self,
        event: CustomResourceEvent,
        started: Instant,
    ) -> Result<RunOutcome<()>, ControllerError> {
        let span = info_span!("cleanup", stack_id = %event.stack_id, request_id = %event.request_id);
        self.process_inner(event, started).instrument(span).await
    }

    async fn process_inner(
        &self,
        event: CustomResourceEvent,
        started: Instant,
    ) -> Result<RunOutcome<()>, ControllerError> {
        if event.request_type != RequestType::Delete {
            info!(request_type = ?event.request_type, "Ignoring non-delete request");
            let mut response = CustomResourceResponse::for_event(&event, ResponseStatus::Success);
            response.physical_resource_id = Some(self.options.log_location.clone());
            self.respond(&event, response).await?;
            return Ok(RunOutcome::Finished(()));
        }

        let result = match event.property(STACK_PROPERTY) {
            Some(stack) => self.run(&event, stack.to_string(), started).await,
            None => Err(ControllerError::ParameterError(format!(
                "Missing resource property {}",
                STACK_PROPERTY
            ))),
        };

        match result {
            Ok(RunOutcome::Finished(())) => {
                let response = CustomResourceResponse::for_event(&event, ResponseStatus::Success);
                self.respond(&event, response).await?;
                Ok(RunOutcome::Finished(()))
            }
            Ok(RunOutcome::Continued) => Ok(RunOutcome::Continued),
            Err(e) => {
                error!(error = %e, "Stack cleanup failed");
                let mut response = CustomResourceResponse::for_event(&event, ResponseStatus::Failed);
                response.reason = Some(self.options.log_location.clone());
                self.respond(&event, response).await?;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        event: &CustomResourceEvent,
        stack: String,
        started: Instant,
    ) -> Result<RunOutcome<()>, ControllerError> {
        let payload = serde_json::to_value(event)?;
        let stacks: Arc<dyn StackManager> = self.services.stacks.clone();
        let watch = self.options.watch.clone();

        run_with_continuation(
            &self.options.continuation,
            self.services.invoker.as_ref(),
            &payload,
            started,
            move |mut cancel| async move { delete_stack(&stack, stacks.as_ref(), &watch, &mut cancel).await },
        )
        .await
    }

    async fn respond(
        &self,
        event: &CustomResourceEvent,
        response: CustomResourceResponse,
    ) -> Result<(), ControllerError> {
        self.services
            .responder
            .respond(&event.response_url, &response)
            .await
    }
}
