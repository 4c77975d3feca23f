//! Commit status models

use serde::{Deserialize, Serialize};

/// Commit status state as understood by the source host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
    Error,
}

/// A named status attached to a revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub state: CommitState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub context: String,
}
