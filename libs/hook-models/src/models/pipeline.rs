//! Pipeline stage change events

use serde::{Deserialize, Serialize};

/// State reported for a pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Started,
    Succeeded,
    Failed,
    Canceled,
    Resumed,
    Superseded,
    #[serde(other)]
    Unknown,
}

/// Stage change detail emitted by the pipeline service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStageEvent {
    pub pipeline: String,

    #[serde(rename = "execution-id")]
    pub execution_id: String,

    pub stage: String,

    pub state: PipelineState,
}
