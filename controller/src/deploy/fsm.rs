//! Reconciliation decision table

use crate::deploy::status::StackStatus;

/// What the push asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    /// The ref was deleted, so its stack should go
    Absent,

    /// The ref exists and its stack should match the pushed templates
    Present,
}

/// Step the reconciler takes against the observed stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Deletion requested for a stack that does not exist
    Skip,

    /// Issue a delete and return without waiting
    Delete,

    /// Create the stack; the pipeline starts on its own
    Create,

    /// Update a settled stack, then watch it
    Update,

    /// An operation is already running; only watch it
    Watch,
}

impl ReconcileAction {
    /// Whether the action is followed by a status watch
    pub fn watches(&self) -> bool {
        matches!(
            self,
            ReconcileAction::Create | ReconcileAction::Update | ReconcileAction::Watch
        )
    }

    /// Whether the action mutates the remote stack
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            ReconcileAction::Delete | ReconcileAction::Create | ReconcileAction::Update
        )
    }
}

/// Decide the next step from the desired state and the observed status.
///
/// A stack with an operation in flight never receives a second mutation;
/// it is only watched.
pub fn plan(desired: DesiredState, status: &StackStatus) -> ReconcileAction {
    match (desired, status.exists) {
        (DesiredState::Absent, false) => ReconcileAction::Skip,
        (DesiredState::Absent, true) => ReconcileAction::Delete,
        (DesiredState::Present, false) => ReconcileAction::Create,
        (DesiredState::Present, true) if status.is_settled() => ReconcileAction::Update,
        (DesiredState::Present, true) => ReconcileAction::Watch,
    }
}
