//! Event queue records

use serde::{Deserialize, Serialize};

/// Event type tag for source-host push events
pub const EVENT_TYPE_PUSH: &str = "push";

/// Change type of a queue record. Only insertions carry new work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Insert,
    Modify,
    Remove,
    #[serde(other)]
    Unknown,
}

/// A stored webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    /// Delivery id assigned by the source host
    pub id: String,

    /// Time the delivery was stored (RFC 3339)
    pub timestamp: String,

    /// Event type tag, e.g. `push`
    #[serde(rename = "type")]
    pub event_type: String,

    /// Raw JSON payload as delivered
    pub payload: String,
}

/// One change on the event queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub event_name: ChangeType,

    pub item: EventItem,
}

impl QueueRecord {
    pub fn insert(item: EventItem) -> Self {
        Self {
            event_name: ChangeType::Insert,
            item,
        }
    }
}

/// Batch of queue records delivered to one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueBatch {
    #[serde(default)]
    pub records: Vec<QueueRecord>,
}
