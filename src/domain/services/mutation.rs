use crate::domain::entities::NotificationId;
use crate::domain::events::MutationKind;

/// What the engine does with its optimistic local change when the server
/// write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Undo the local change exactly.
    Rollback,
    /// Keep local changes; the next refresh converges.
    BestEffort,
    /// Keep local changes even though the server still has the old state.
    AcceptDivergence,
}

impl MutationKind {
    pub const fn rollback_policy(self) -> RollbackPolicy {
        match self {
            MutationKind::MarkRead => RollbackPolicy::Rollback,
            MutationKind::MarkAllRead => RollbackPolicy::BestEffort,
            MutationKind::Delete => RollbackPolicy::AcceptDivergence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Local state and server agree.
    Applied,
    /// The server write failed and the local change was undone.
    RolledBack { error: String },
    /// The server write failed (fully or for `failed_ids`) and the local
    /// change was kept.
    Diverged {
        failed_ids: Vec<NotificationId>,
        error: String,
    },
    /// Nothing was attempted.
    Rejected { reason: String },
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            MutationOutcome::Applied => None,
            MutationOutcome::RolledBack { error } | MutationOutcome::Diverged { error, .. } => {
                Some(error)
            }
            MutationOutcome::Rejected { reason } => Some(reason),
        }
    }
}
