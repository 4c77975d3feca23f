//! Wire models shared by the pipewright controller and its callers.

pub mod models;

pub use models::pipeline::{PipelineStageEvent, PipelineState};
pub use models::push::{Owner, PushEvent, Repository};
pub use models::queue::{ChangeType, EventItem, QueueBatch, QueueRecord, EVENT_TYPE_PUSH};
pub use models::resource::{
    CustomResourceEvent, CustomResourceResponse, RequestType, ResponseStatus,
};
pub use models::status::{CommitState, CommitStatus};
