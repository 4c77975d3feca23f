//! Pipeline stage notifications
//!
//! Mirrors pipeline stage changes onto the source revision as commit
//! statuses, one context per stage.

use tracing::{info, info_span, Instrument};

use crate::errors::ControllerError;
use crate::models::{CommitState, CommitStatus, PipelineStageEvent, PipelineState};
use crate::services::Services;
use crate::utils::{render_url, short_hash};

#[derive(Debug, Clone)]
pub struct NotifierOptions {
    /// Secret key of the source host access token
    pub token_key: String,

    /// Status target URL template with a `{pipeline}` placeholder
    pub target_url: String,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            token_key: "github-token".to_string(),
            target_url: String::new(),
        }
    }
}

/// Commit state reported for a pipeline stage state
pub fn commit_state(state: PipelineState) -> CommitState {
    match state {
        PipelineState::Started => CommitState::Pending,
        PipelineState::Succeeded => CommitState::Success,
        _ => CommitState::Failure,
    }
}

pub struct PipelineNotifier {
    services: Services,
    options: NotifierOptions,
}

impl PipelineNotifier {
    pub fn new(services: Services, options: NotifierOptions) -> Self {
        Self { services, options }
    }

    pub async fn process(&self, event: PipelineStageEvent) -> Result<(), ControllerError> {
        let span = info_span!("pipeline", pipeline = %event.pipeline, stage = %event.stage);
        self.process_inner(event).instrument(span).await
    }

    async fn process_inner(&self, event: PipelineStageEvent) -> Result<(), ControllerError> {
        let pipelines = &self.services.pipelines;
        let (owner, name) = pipelines.repo_info(&event.pipeline).await?;
        let revision = pipelines.revision(&event.pipeline, &event.execution_id).await?;

        let token = self.services.secrets.get(&self.options.token_key).await?;
        let repo = self.services.repos.open(&owner, &name, &token)?;

        let status = CommitStatus {
            state: commit_state(event.state),
            target_url: render_url(&self.options.target_url, "pipeline", &event.pipeline),
            description: None,
            context: format!("pipeline/{}", event.stage),
        };
        repo.status(&revision, &status).await?;

        info!(
            commit = %short_hash(&revision),
            state = ?status.state,
            "Pipeline stage status posted"
        );
        Ok(())
    }
}
