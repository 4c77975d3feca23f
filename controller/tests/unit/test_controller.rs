mod common;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::time::Instant;

use common::{
    executor_options, push_event, FakeRepo, FakeRepos, FakeStacks, Harness, StackCall, NEVER,
    PARAMETERS, PIPELINE, TOKEN,
};
use pipewright::deploy::batch::{handle_batch, BatchReport};
use pipewright::deploy::continuation::RunOutcome;
use pipewright::deploy::executor::PushExecutor;
use pipewright::deploy::reconciler::ReconcileOutcome;
use pipewright::errors::ControllerError;
use pipewright::models::build::Parameter;
use pipewright::models::{ChangeType, CommitState, EventItem, QueueBatch, QueueRecord};
use pipewright::services::{Repository, RepositoryProvider};

fn executor(harness: &Harness) -> PushExecutor {
    PushExecutor::new(harness.services(), executor_options(Duration::from_secs(5)))
}

fn parameter<'a>(parameters: &'a [Parameter], key: &str) -> Option<&'a str> {
    parameters
        .iter()
        .find(|p| p.key == key)
        .map(|p| p.value.as_str())
}

#[tokio::test]
async fn test_branch_push_creates_stack() {
    let harness = Harness::new(FakeStacks::new(2), FakeRepo::standard());

    let outcome = executor(&harness)
        .process(push_event("refs/heads/dev-1"), Instant::now())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Finished(ReconcileOutcome::Created));
    assert_eq!(
        harness.stacks.calls(),
        vec![StackCall::Create("widgets-dev-1".to_string())]
    );
    assert_eq!(
        harness.repo.opened(),
        vec![("acme".to_string(), "widgets".to_string())]
    );

    let parameters = harness.stacks.last_parameters();
    assert_eq!(parameter(&parameters, "Size"), Some("small"));
    assert_eq!(parameter(&parameters, "Stage"), Some("development"));
    assert_eq!(parameter(&parameters, "RepoBranch"), Some("dev-1"));
    assert_eq!(parameter(&parameters, "RepoOwner"), Some("acme"));
    assert_eq!(parameter(&parameters, "RepoName"), Some("widgets"));
    assert_eq!(parameter(&parameters, "RepoToken"), Some(TOKEN));
    assert_eq!(parameter(&parameters, "ArtifactStore"), Some("artifact-bucket"));
    assert_eq!(parameter(&parameters, "DeployStackLocation"), None);

    let statuses = harness.repo.statuses();
    assert_eq!(harness.repo.states(), vec![CommitState::Pending, CommitState::Success]);
    for (revision, status) in &statuses {
        assert_eq!(revision, "9f2c4e1a7b");
        assert_eq!(status.context, "pipeline/prep");
        assert_eq!(
            status.target_url.as_deref(),
            Some("https://ci.example/commit/9f2c4e1a7b")
        );
    }
}

#[tokio::test]
async fn test_master_push_updates_and_builds() {
    let stacks = FakeStacks::new(1);
    stacks.seed("widgets-master", "UPDATE_COMPLETE", true);
    let harness = Harness::new(stacks, FakeRepo::standard());

    let outcome = executor(&harness)
        .process(push_event("refs/heads/master"), Instant::now())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Finished(ReconcileOutcome::Updated { build_started: true })
    );
    let parameters = harness.stacks.last_parameters();
    assert_eq!(parameter(&parameters, "Stage"), Some("master"));
    assert_eq!(parameter(&parameters, "Size"), Some("medium"));
    assert_eq!(harness.repo.states(), vec![CommitState::Pending, CommitState::Success]);
}

#[tokio::test]
async fn test_deploy_template_is_staged() {
    let repo = FakeRepo::with_files(&[
        ("pipeline.json", PIPELINE),
        ("parameters.json", PARAMETERS),
        ("deploy.json", r#"{"Resources":{"Service":{}}}"#),
    ]);
    let harness = Harness::new(FakeStacks::new(0), repo);

    executor(&harness)
        .process(push_event("refs/tags/v1.4.0"), Instant::now())
        .await
        .unwrap();

    assert_eq!(
        harness.artifacts.keys(),
        vec!["deploy/acme/widgets/9f2c4e1a7b/deploy.json".to_string()]
    );
    let parameters = harness.stacks.last_parameters();
    assert_eq!(
        parameter(&parameters, "DeployStackLocation"),
        Some("artifacts/deploy/acme/widgets/9f2c4e1a7b/deploy.json")
    );
    assert_eq!(parameter(&parameters, "Stage"), Some("release"));
    assert_eq!(
        harness.stacks.calls(),
        vec![StackCall::Create("widgets-release".to_string())]
    );
}

#[tokio::test]
async fn test_deadline_hands_off_push() {
    let harness = Harness::new(FakeStacks::new(NEVER), FakeRepo::standard());
    let executor = PushExecutor::new(
        harness.services(),
        executor_options(Duration::from_millis(100)),
    );
    let event = push_event("refs/heads/dev-1");

    let outcome = executor.process(event.clone(), Instant::now()).await.unwrap();

    assert_eq!(outcome, RunOutcome::Continued);
    let invocations = harness.invoker.calls();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "push");
    assert_eq!(invocations[0].1, serde_json::to_value(&event).unwrap());

    // The next invocation reports the result
    assert_eq!(harness.repo.states(), vec![CommitState::Pending]);
    assert_eq!(harness.stacks.mutations(), 1);
}

#[tokio::test]
async fn test_continued_push_resumes_watch() {
    let stacks = FakeStacks::new(1);
    stacks.seed_running("widgets-dev-1", "CREATE_IN_PROGRESS", "CREATE_COMPLETE", 2);
    let harness = Harness::new(stacks, FakeRepo::standard());

    let outcome = executor(&harness)
        .process(push_event("refs/heads/dev-1"), Instant::now())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Finished(ReconcileOutcome::Watched { build_started: false })
    );
    assert!(harness.stacks.calls().is_empty());
    assert!(harness.invoker.calls().is_empty());
    assert_eq!(harness.repo.states(), vec![CommitState::Pending, CommitState::Success]);
}

#[tokio::test]
async fn test_missing_template_reports_failure() {
    let repo = FakeRepo::with_files(&[("parameters.json", PARAMETERS)]);
    let harness = Harness::new(FakeStacks::new(0), repo);

    let err = executor(&harness)
        .process(push_event("refs/heads/dev-1"), Instant::now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ControllerError::TemplateFetchError { ref path, .. } if path == "pipeline.json"
    ));
    assert!(harness.stacks.calls().is_empty());

    let statuses = harness.repo.statuses();
    assert_eq!(harness.repo.states(), vec![CommitState::Pending, CommitState::Failure]);
    let description = statuses[1].1.description.clone().unwrap_or_default();
    assert!(description.contains("pipeline.json"));
    assert!(description.chars().count() <= 140);
}

#[tokio::test]
async fn test_failed_stack_reports_failure() {
    let stacks = FakeStacks::new(1);
    stacks.fail_next("ROLLBACK_COMPLETE");
    let harness = Harness::new(stacks, FakeRepo::standard());

    let err = executor(&harness)
        .process(push_event("refs/heads/dev-1"), Instant::now())
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::StackFailed { .. }));
    assert_eq!(harness.repo.states(), vec![CommitState::Pending, CommitState::Failure]);
    assert!(harness.invoker.calls().is_empty());
}

#[tokio::test]
async fn test_deleted_branch_removes_stack() {
    let stacks = FakeStacks::new(NEVER);
    stacks.seed("widgets-feature", "UPDATE_COMPLETE", true);
    let harness = Harness::new(stacks, FakeRepo::standard());

    let mut event = push_event("refs/heads/feature");
    event.after = "0000000000000000000000000000000000000000".to_string();
    event.deleted = true;

    let outcome = executor(&harness).process(event, Instant::now()).await.unwrap();

    assert_eq!(outcome, RunOutcome::Finished(ReconcileOutcome::DeleteRequested));
    assert_eq!(
        harness.stacks.calls(),
        vec![StackCall::Delete("widgets-feature".to_string())]
    );
    assert!(harness.repo.statuses().is_empty());
}

// ================================== BATCHES ===================================== //

/// Repository provider that panics for one repository name
struct ExplodingRepos {
    inner: FakeRepos,
    name: &'static str,
}

impl RepositoryProvider for ExplodingRepos {
    fn open(
        &self,
        owner: &str,
        name: &str,
        token: &SecretString,
    ) -> Result<Arc<dyn Repository>, ControllerError> {
        if name == self.name {
            panic!("repository {} exploded", name);
        }
        self.inner.open(owner, name, token)
    }
}

fn record(id: &str, change: ChangeType, event_type: &str, payload: String) -> QueueRecord {
    QueueRecord {
        event_name: change,
        item: EventItem {
            id: id.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            event_type: event_type.to_string(),
            payload,
        },
    }
}

fn push_payload(reference: &str, repo: &str) -> String {
    let mut event = push_event(reference);
    event.repository.name = repo.to_string();
    serde_json::to_string(&event).unwrap()
}

#[tokio::test]
async fn test_batch_isolates_records() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::standard());
    let mut services = harness.services();
    services.repos = Arc::new(ExplodingRepos {
        inner: FakeRepos {
            repo: harness.repo.clone(),
        },
        name: "gadgets",
    });
    let executor = PushExecutor::new(services, executor_options(Duration::from_secs(5)));

    let batch = QueueBatch {
        records: vec![
            record("1", ChangeType::Insert, "push", push_payload("refs/heads/dev-1", "gadgets")),
            record("2", ChangeType::Modify, "push", push_payload("refs/heads/dev-1", "widgets")),
            record("3", ChangeType::Insert, "ping", r#"{"zen":"keep it simple"}"#.to_string()),
            record("4", ChangeType::Insert, "push", "{not json".to_string()),
            record("5", ChangeType::Insert, "push", push_payload("refs/heads/dev-1", "widgets")),
        ],
    };

    let report = handle_batch(&executor, batch, Instant::now()).await;

    assert_eq!(
        report,
        BatchReport {
            reconciled: 1,
            continued: 0,
            failed: 1,
            skipped: 3,
        }
    );
    assert_eq!(
        harness.stacks.calls(),
        vec![StackCall::Create("widgets-dev-1".to_string())]
    );
}

#[tokio::test]
async fn test_batch_counts_failures_and_continues() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::with_files(&[]));
    let executor = executor(&harness);

    let batch = QueueBatch {
        records: vec![
            record("1", ChangeType::Insert, "push", push_payload("refs/heads/dev-1", "widgets")),
            record("2", ChangeType::Insert, "push", push_payload("refs/heads/dev-2", "widgets")),
        ],
    };

    let report = handle_batch(&executor, batch, Instant::now()).await;

    assert_eq!(report.failed, 2);
    assert_eq!(report.reconciled, 0);
    assert_eq!(
        harness.repo.states(),
        vec![
            CommitState::Pending,
            CommitState::Failure,
            CommitState::Pending,
            CommitState::Failure,
        ]
    );
}
