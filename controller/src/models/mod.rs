//! Data models

pub mod build;

pub use hook_models::{
    ChangeType, CommitState, CommitStatus, CustomResourceEvent, CustomResourceResponse,
    EventItem, PipelineStageEvent, PipelineState, PushEvent, QueueBatch, QueueRecord,
    RequestType, ResponseStatus, EVENT_TYPE_PUSH,
};
