use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::{Role, UserId};

/// Which two-stage approval chain a record travels through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    /// Monetary records: general manager first, then admin.
    Finance,
    /// Leave requests: project coordinator first, then HR.
    Leave,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    Pending,
    FirstApproved,
    FinalApproved,
    Rejected,
    Cancelled,
}

impl ChainState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalApproved | Self::Rejected | Self::Cancelled)
    }

    /// Chain-specific status label, matching the tags the dashboards
    /// render (`gm_approved`, `coordinator_approved`, ...).
    pub fn label_for(&self, kind: ChainKind) -> &'static str {
        match (kind, self) {
            (_, Self::Pending) => "pending",
            (_, Self::Rejected) => "rejected",
            (_, Self::Cancelled) => "cancelled",
            (ChainKind::Finance, Self::FirstApproved) => "gm_approved",
            (ChainKind::Finance, Self::FinalApproved) => "admin_approved",
            (ChainKind::Leave, Self::FirstApproved) => "coordinator_approved",
            (ChainKind::Leave, Self::FinalApproved) => "hr_approved",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalEvent {
    FirstApprove { actor: UserId, actor_role: Role, comments: Option<String> },
    FinalApprove { actor: UserId, actor_role: Role, comments: Option<String> },
    Reject { actor: UserId, actor_role: Role, reason: String },
    Cancel { actor: UserId },
}

impl ApprovalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstApprove { .. } => "first_approve",
            Self::FinalApprove { .. } => "final_approve",
            Self::Reject { .. } => "reject",
            Self::Cancel { .. } => "cancel",
        }
    }

    pub fn actor(&self) -> &UserId {
        match self {
            Self::FirstApprove { actor, .. }
            | Self::FinalApprove { actor, .. }
            | Self::Reject { actor, .. }
            | Self::Cancel { actor } => actor,
        }
    }
}

/// Who signed a stage off, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageApproval {
    pub by: UserId,
    pub at: DateTime<Utc>,
    pub comments: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ChainState,
    pub to: ChainState,
    pub event: ApprovalEvent,
    /// Sign-off recorded by an approval event; `None` for reject/cancel.
    pub recorded: Option<StageApproval>,
}

#[cfg(test)]
mod tests {
    use super::{ChainKind, ChainState};

    #[test]
    fn labels_follow_the_chain_kind() {
        assert_eq!(ChainState::FirstApproved.label_for(ChainKind::Finance), "gm_approved");
        assert_eq!(ChainState::FinalApproved.label_for(ChainKind::Finance), "admin_approved");
        assert_eq!(
            ChainState::FirstApproved.label_for(ChainKind::Leave),
            "coordinator_approved"
        );
        assert_eq!(ChainState::FinalApproved.label_for(ChainKind::Leave), "hr_approved");
        assert_eq!(ChainState::Pending.label_for(ChainKind::Finance), "pending");
    }

    #[test]
    fn terminal_states_are_marked() {
        assert!(ChainState::FinalApproved.is_terminal());
        assert!(ChainState::Rejected.is_terminal());
        assert!(ChainState::Cancelled.is_terminal());
        assert!(!ChainState::Pending.is_terminal());
        assert!(!ChainState::FirstApproved.is_terminal());
    }
}
