//! Push event executor

use secrecy::SecretString;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::deploy::context::{assemble, stage_deploy_template, TemplateFiles};
use crate::deploy::continuation::{run_with_continuation, ContinuationOptions, RunOutcome};
use crate::deploy::params::enrich;
use crate::deploy::reconciler::{DesiredStack, ReconcileOutcome, Reconciler};
use crate::deploy::refs::StackIdentity;
use crate::deploy::watch::WatchOptions;
use crate::errors::ControllerError;
use crate::models::{CommitState, CommitStatus, PushEvent};
use crate::services::{Repository, Services};
use crate::utils::{render_url, short_hash, status_description};

/// Push executor options
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub continuation: ContinuationOptions,
    pub watch: WatchOptions,
    pub files: TemplateFiles,

    /// Artifact store handed to every pipeline stack
    pub artifact_store: String,

    /// Secret key of the source host access token
    pub token_key: String,

    /// Commit status context for reconciliation results
    pub status_context: String,

    /// Status target URL template with a `{commit}` placeholder
    pub target_url: String,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            continuation: ContinuationOptions::default(),
            watch: WatchOptions::default(),
            files: TemplateFiles::default(),
            artifact_store: "pipewright-artifacts".to_string(),
            token_key: "github-token".to_string(),
            status_context: "pipeline/prep".to_string(),
            target_url: String::new(),
        }
    }
}

/// Reconciles the pipeline stack of one push and reports the result as a
/// commit status
pub struct PushExecutor {
    services: Services,
    options: ExecutorOptions,
}

impl PushExecutor {
    pub fn new(services: Services, options: ExecutorOptions) -> Self {
        Self { services, options }
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Process a push event whose invocation started at `started`
    pub async fn process(
        &self,
        event: PushEvent,
        started: Instant,
    ) -> Result<RunOutcome<ReconcileOutcome>, ControllerError> {
        let span = info_span!(
            "push",
            reference = %event.reference,
            commit = %short_hash(&event.after),
            repo = %event.repo_name(),
        );
        self.process_inner(event, started).instrument(span).await
    }

    async fn process_inner(
        &self,
        event: PushEvent,
        started: Instant,
    ) -> Result<RunOutcome<ReconcileOutcome>, ControllerError> {
        let identity = StackIdentity::resolve(event.repo_name(), &event.reference);
        info!(stack = %identity.name, class = %identity.class, "Processing push");

        let token = self.services.secrets.get(&self.options.token_key).await?;
        let repo = self
            .services
            .repos
            .open(event.owner(), event.repo_name(), &token)?;

        // A removed ref has no revision to report against
        let report = !event.deleted;
        if report {
            self.post_status(repo.as_ref(), &event, CommitState::Pending, "Updating pipeline stack")
                .await;
        }

        let result = self.reconcile(&event, &identity, &token, repo.as_ref(), started).await;

        match &result {
            Ok(RunOutcome::Finished(outcome)) => {
                info!(stack = %identity.name, ?outcome, "Push reconciled");
                if report {
                    self.post_status(repo.as_ref(), &event, CommitState::Success, "Pipeline stack is up to date")
                        .await;
                }
            }
            Ok(RunOutcome::Continued) => {
                info!(stack = %identity.name, "Push handed to a new invocation");
            }
            Err(e) => {
                error!(stack = %identity.name, error = %e, "Push reconciliation failed");
                if report {
                    self.post_status(repo.as_ref(), &event, CommitState::Failure, &e.to_string())
                        .await;
                }
            }
        }

        result
    }

    async fn reconcile(
        &self,
        event: &PushEvent,
        identity: &StackIdentity,
        token: &SecretString,
        repo: &dyn Repository,
        started: Instant,
    ) -> Result<RunOutcome<ReconcileOutcome>, ControllerError> {
        let desired = if event.deleted {
            DesiredStack::Absent
        } else {
            let mut context = assemble(event, identity.class, repo, &self.options.files).await?;
            stage_deploy_template(&mut context, event, self.services.artifacts.as_ref()).await?;
            context.parameters =
                enrich(&context.parameters, event, token, &self.options.artifact_store);
            DesiredStack::Present(context)
        };

        let payload = serde_json::to_value(event)?;
        let reconciler = Reconciler::new(self.services.stacks.clone(), self.options.watch.clone());
        let stack = identity.name.clone();

        run_with_continuation(
            &self.options.continuation,
            self.services.invoker.as_ref(),
            &payload,
            started,
            move |mut cancel| async move { reconciler.reconcile(&stack, &desired, &mut cancel).await },
        )
        .await
    }

    async fn post_status(
        &self,
        repo: &dyn Repository,
        event: &PushEvent,
        state: CommitState,
        description: &str,
    ) {
        let status = CommitStatus {
            state,
            target_url: render_url(&self.options.target_url, "commit", &event.after),
            description: Some(status_description(description)),
            context: self.options.status_context.clone(),
        };

        if let Err(e) = repo.status(&event.after, &status).await {
            warn!(state = ?state, error = %e, "Failed to post commit status");
        }
    }
}
