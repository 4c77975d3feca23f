//! Stack status classification

use serde::{Deserialize, Serialize};

/// Raw status reported for a stack that does not exist
pub const DOES_NOT_EXIST: &str = "DOES_NOT_EXIST";

/// Raw status of a fully deleted stack
pub const DELETE_COMPLETE: &str = "DELETE_COMPLETE";

/// Coarse phase of a stack operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    InProgress,
    Complete,
    Failed,
    RolledBack,
}

impl StackPhase {
    /// Classify a raw provisioning-service status string.
    ///
    /// `_FAILED` wins over `ROLLBACK`, so `UPDATE_ROLLBACK_FAILED` is Failed.
    /// Any status mentioning a rollback is RolledBack, in progress or not.
    pub fn classify(raw: &str) -> Self {
        if raw.ends_with("_FAILED") {
            StackPhase::Failed
        } else if raw.contains("ROLLBACK") {
            StackPhase::RolledBack
        } else if raw.ends_with("_COMPLETE") {
            StackPhase::Complete
        } else {
            StackPhase::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StackPhase::InProgress)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StackPhase::Failed | StackPhase::RolledBack)
    }
}

/// Existence and raw status of a stack as last observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStatus {
    pub exists: bool,
    pub raw: String,
}

impl StackStatus {
    pub fn missing() -> Self {
        Self {
            exists: false,
            raw: DOES_NOT_EXIST.to_string(),
        }
    }

    pub fn existing(raw: impl Into<String>) -> Self {
        Self {
            exists: true,
            raw: raw.into(),
        }
    }

    pub fn phase(&self) -> StackPhase {
        StackPhase::classify(&self.raw)
    }

    /// No operation is running against the stack, so it may be mutated.
    ///
    /// Rollbacks that have finished (`UPDATE_ROLLBACK_COMPLETE`) are settled,
    /// rollbacks still running are not.
    pub fn is_settled(&self) -> bool {
        self.raw.ends_with("_COMPLETE") || self.raw.ends_with("_FAILED")
    }

    /// The stack is gone, either never created or fully deleted
    pub fn is_gone(&self) -> bool {
        !self.exists || self.raw == DELETE_COMPLETE
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
