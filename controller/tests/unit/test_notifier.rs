mod common;

use common::{FakeRepo, FakeStacks, Harness, TOKEN_KEY};
use pipewright::models::{CommitState, PipelineStageEvent, PipelineState};
use pipewright::notifier::{NotifierOptions, PipelineNotifier};

fn notifier(harness: &Harness) -> PipelineNotifier {
    let options = NotifierOptions {
        token_key: TOKEN_KEY.to_string(),
        target_url: "https://pipelines.example/{pipeline}".to_string(),
    };
    PipelineNotifier::new(harness.services(), options)
}

fn stage_event(stage: &str, state: PipelineState) -> PipelineStageEvent {
    PipelineStageEvent {
        pipeline: "widgets-dev-1".to_string(),
        execution_id: "exec-42".to_string(),
        stage: stage.to_string(),
        state,
    }
}

#[tokio::test]
async fn test_stage_success_posts_status() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::standard());

    notifier(&harness)
        .process(stage_event("Build", PipelineState::Succeeded))
        .await
        .unwrap();

    assert_eq!(
        harness.repo.opened(),
        vec![("acme".to_string(), "widgets".to_string())]
    );
    let statuses = harness.repo.statuses();
    assert_eq!(statuses.len(), 1);
    let (revision, status) = &statuses[0];
    assert_eq!(revision, "9f2c4e1a7b");
    assert_eq!(status.state, CommitState::Success);
    assert_eq!(status.context, "pipeline/Build");
    assert_eq!(
        status.target_url.as_deref(),
        Some("https://pipelines.example/widgets-dev-1")
    );
    assert_eq!(status.description, None);
}

#[tokio::test]
async fn test_stage_states_map_to_commit_states() {
    let harness = Harness::new(FakeStacks::new(0), FakeRepo::standard());
    let notifier = notifier(&harness);

    for (stage, state) in [
        ("Source", PipelineState::Started),
        ("Build", PipelineState::Failed),
        ("Deploy", PipelineState::Superseded),
    ] {
        notifier.process(stage_event(stage, state)).await.unwrap();
    }

    assert_eq!(
        harness.repo.states(),
        vec![CommitState::Pending, CommitState::Failure, CommitState::Failure]
    );
}
