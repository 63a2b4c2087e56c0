use chrono::Utc;
use thiserror::Error;

use crate::approvals::states::{
    ApprovalEvent, ChainKind, ChainState, StageApproval, TransitionOutcome,
};
use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::user::Role;

/// A two-stage sign-off chain. The first stage must be cleared before
/// the final stage; rejection is terminal and carries a reason.
pub trait ApprovalChain {
    fn kind(&self) -> ChainKind;
    fn first_approver_role(&self) -> Role;
    fn final_approver_role(&self) -> Role;
    fn allows_cancel(&self) -> bool;

    fn initial_state(&self) -> ChainState {
        ChainState::Pending
    }

    fn transition(
        &self,
        current: &ChainState,
        event: &ApprovalEvent,
    ) -> Result<TransitionOutcome, ApprovalTransitionError> {
        transition_two_stage(self.chain_config(), current, event)
    }

    fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            kind: self.kind(),
            first_approver_role: self.first_approver_role(),
            final_approver_role: self.final_approver_role(),
            allows_cancel: self.allows_cancel(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChainConfig {
    pub kind: ChainKind,
    pub first_approver_role: Role,
    pub final_approver_role: Role,
    pub allows_cancel: bool,
}

/// GM then admin sign-off for monetary records. No cancellation path:
/// a submitted expense either settles or is rejected with a reason.
#[derive(Clone, Copy, Debug, Default)]
pub struct FinanceChain;

impl ApprovalChain for FinanceChain {
    fn kind(&self) -> ChainKind {
        ChainKind::Finance
    }

    fn first_approver_role(&self) -> Role {
        Role::GeneralManager
    }

    fn final_approver_role(&self) -> Role {
        Role::Admin
    }

    fn allows_cancel(&self) -> bool {
        false
    }
}

/// Coordinator then HR sign-off for leave requests. The requester may
/// cancel any request that has not reached a terminal state.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeaveChain;

impl ApprovalChain for LeaveChain {
    fn kind(&self) -> ChainKind {
        ChainKind::Leave
    }

    fn first_approver_role(&self) -> Role {
        Role::ProjectCoordinator
    }

    fn final_approver_role(&self) -> Role {
        Role::HrManager
    }

    fn allows_cancel(&self) -> bool {
        true
    }
}

pub struct ApprovalEngine<C> {
    chain: C,
}

impl<C> ApprovalEngine<C>
where
    C: ApprovalChain,
{
    pub fn new(chain: C) -> Self {
        Self { chain }
    }

    pub fn kind(&self) -> ChainKind {
        self.chain.kind()
    }

    pub fn initial_state(&self) -> ChainState {
        self.chain.initial_state()
    }

    pub fn apply(
        &self,
        current: &ChainState,
        event: &ApprovalEvent,
    ) -> Result<TransitionOutcome, ApprovalTransitionError> {
        self.chain.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        subject_id: &str,
        current: &ChainState,
        event: &ApprovalEvent,
        sink: &S,
    ) -> Result<TransitionOutcome, ApprovalTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        let category = match self.chain.kind() {
            ChainKind::Finance => AuditCategory::Finance,
            ChainKind::Leave => AuditCategory::Leave,
        };
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        Some(subject_id.to_owned()),
                        "approval.transition_applied",
                        category,
                        event.actor().0.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.label_for(self.chain.kind()))
                    .with_metadata("to", outcome.to.label_for(self.chain.kind()))
                    .with_metadata("event", event.name()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        Some(subject_id.to_owned()),
                        "approval.transition_refused",
                        category,
                        event.actor().0.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("event", event.name())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for ApprovalEngine<FinanceChain> {
    fn default() -> Self {
        Self::new(FinanceChain)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApprovalTransitionError {
    #[error("event `{event}` is not legal in state {state:?}")]
    IllegalTransition { state: ChainState, event: &'static str },
    #[error("final approval requires first-stage sign-off (state {state:?})")]
    OutOfOrderApproval { state: ChainState },
    #[error("stage requires role `{required}`, actor holds `{actual}`")]
    RoleNotPermitted { required: Role, actual: Role },
    #[error("rejection requires a non-empty reason")]
    MissingRejectionReason,
    #[error("{kind:?} chain does not support cancellation")]
    CancellationNotSupported { kind: ChainKind },
}

fn transition_two_stage(
    config: ChainConfig,
    current: &ChainState,
    event: &ApprovalEvent,
) -> Result<TransitionOutcome, ApprovalTransitionError> {
    use ApprovalEvent::{Cancel, FinalApprove, FirstApprove, Reject};
    use ChainState::{Cancelled, FirstApproved, FinalApproved, Pending, Rejected};

    if current.is_terminal() {
        return Err(ApprovalTransitionError::IllegalTransition {
            state: *current,
            event: event.name(),
        });
    }

    let (to, recorded) = match (current, event) {
        (Pending, FirstApprove { actor, actor_role, comments }) => {
            require_role(config.first_approver_role, *actor_role)?;
            (FirstApproved, Some(stage(actor.clone(), comments.clone())))
        }
        (Pending, FinalApprove { .. }) => {
            return Err(ApprovalTransitionError::OutOfOrderApproval { state: *current });
        }
        (FirstApproved, FinalApprove { actor, actor_role, comments }) => {
            require_role(config.final_approver_role, *actor_role)?;
            (FinalApproved, Some(stage(actor.clone(), comments.clone())))
        }
        (Pending | FirstApproved, Reject { actor_role, reason, .. }) => {
            // The stage currently awaiting sign-off owns the rejection.
            let required = match current {
                Pending => config.first_approver_role,
                _ => config.final_approver_role,
            };
            require_role(required, *actor_role)?;
            if reason.trim().is_empty() {
                return Err(ApprovalTransitionError::MissingRejectionReason);
            }
            (Rejected, None)
        }
        (Pending | FirstApproved, Cancel { .. }) => {
            if !config.allows_cancel {
                return Err(ApprovalTransitionError::CancellationNotSupported {
                    kind: config.kind,
                });
            }
            (Cancelled, None)
        }
        _ => {
            return Err(ApprovalTransitionError::IllegalTransition {
                state: *current,
                event: event.name(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), recorded })
}

fn require_role(required: Role, actual: Role) -> Result<(), ApprovalTransitionError> {
    if actual == required {
        Ok(())
    } else {
        Err(ApprovalTransitionError::RoleNotPermitted { required, actual })
    }
}

fn stage(by: crate::domain::user::UserId, comments: Option<String>) -> StageApproval {
    StageApproval { by, at: Utc::now(), comments }
}

#[cfg(test)]
mod tests {
    use crate::approvals::engine::{
        ApprovalChain, ApprovalEngine, ApprovalTransitionError, FinanceChain, LeaveChain,
    };
    use crate::approvals::states::{ApprovalEvent, ChainKind, ChainState};
    use crate::audit::InMemoryAuditSink;
    use crate::domain::user::{Role, UserId};

    fn first_approve(role: Role) -> ApprovalEvent {
        ApprovalEvent::FirstApprove {
            actor: UserId("u-first".to_owned()),
            actor_role: role,
            comments: None,
        }
    }

    fn final_approve(role: Role) -> ApprovalEvent {
        ApprovalEvent::FinalApprove {
            actor: UserId("u-final".to_owned()),
            actor_role: role,
            comments: Some("looks right".to_owned()),
        }
    }

    fn reject(role: Role, reason: &str) -> ApprovalEvent {
        ApprovalEvent::Reject {
            actor: UserId("u-rej".to_owned()),
            actor_role: role,
            reason: reason.to_owned(),
        }
    }

    #[test]
    fn finance_chain_settles_after_gm_then_admin() {
        let engine = ApprovalEngine::new(FinanceChain);
        let mut state = engine.initial_state();

        let outcome = engine
            .apply(&state, &first_approve(Role::GeneralManager))
            .expect("pending -> gm_approved");
        assert_eq!(outcome.to, ChainState::FirstApproved);
        assert!(outcome.recorded.is_some());
        state = outcome.to;

        let outcome = engine
            .apply(&state, &final_approve(Role::Admin))
            .expect("gm_approved -> admin_approved");
        assert_eq!(outcome.to, ChainState::FinalApproved);
        let recorded = outcome.recorded.expect("final stage sign-off recorded");
        assert_eq!(recorded.by, UserId("u-final".to_owned()));
        assert_eq!(recorded.comments.as_deref(), Some("looks right"));
    }

    #[test]
    fn admin_cannot_settle_before_gm() {
        let engine = ApprovalEngine::new(FinanceChain);
        let error = engine
            .apply(&ChainState::Pending, &final_approve(Role::Admin))
            .expect_err("admin approval must wait for GM");
        assert_eq!(
            error,
            ApprovalTransitionError::OutOfOrderApproval { state: ChainState::Pending }
        );
    }

    #[test]
    fn wrong_role_is_refused_per_stage() {
        let engine = ApprovalEngine::new(FinanceChain);

        let error = engine
            .apply(&ChainState::Pending, &first_approve(Role::Admin))
            .expect_err("first stage belongs to the GM");
        assert_eq!(
            error,
            ApprovalTransitionError::RoleNotPermitted {
                required: Role::GeneralManager,
                actual: Role::Admin,
            }
        );

        let error = engine
            .apply(&ChainState::FirstApproved, &final_approve(Role::GeneralManager))
            .expect_err("final stage belongs to the admin");
        assert_eq!(
            error,
            ApprovalTransitionError::RoleNotPermitted {
                required: Role::Admin,
                actual: Role::GeneralManager,
            }
        );
    }

    #[test]
    fn rejection_requires_a_reason() {
        let engine = ApprovalEngine::new(FinanceChain);
        let error = engine
            .apply(&ChainState::Pending, &reject(Role::GeneralManager, "   "))
            .expect_err("blank reason refused");
        assert_eq!(error, ApprovalTransitionError::MissingRejectionReason);

        let outcome = engine
            .apply(&ChainState::Pending, &reject(Role::GeneralManager, "duplicate claim"))
            .expect("reject with reason");
        assert_eq!(outcome.to, ChainState::Rejected);
    }

    #[test]
    fn rejection_is_terminal() {
        let engine = ApprovalEngine::new(FinanceChain);
        let error = engine
            .apply(&ChainState::Rejected, &first_approve(Role::GeneralManager))
            .expect_err("no event leaves a terminal state");
        assert!(matches!(error, ApprovalTransitionError::IllegalTransition { .. }));
    }

    #[test]
    fn finance_chain_has_no_cancellation() {
        let engine = ApprovalEngine::new(FinanceChain);
        let error = engine
            .apply(&ChainState::Pending, &ApprovalEvent::Cancel { actor: UserId("e".into()) })
            .expect_err("finance records cannot be cancelled");
        assert_eq!(
            error,
            ApprovalTransitionError::CancellationNotSupported { kind: ChainKind::Finance }
        );
    }

    #[test]
    fn leave_chain_routes_coordinator_then_hr() {
        let engine = ApprovalEngine::new(LeaveChain);
        let mut state = engine.initial_state();

        state = engine
            .apply(&state, &first_approve(Role::ProjectCoordinator))
            .expect("pending -> coordinator_approved")
            .to;
        let outcome = engine
            .apply(&state, &final_approve(Role::HrManager))
            .expect("coordinator_approved -> hr_approved");
        assert_eq!(outcome.to, ChainState::FinalApproved);
    }

    #[test]
    fn leave_requests_can_be_cancelled_until_settled() {
        let engine = ApprovalEngine::new(LeaveChain);
        let cancel = ApprovalEvent::Cancel { actor: UserId("u-emp".to_owned()) };

        let outcome = engine.apply(&ChainState::Pending, &cancel).expect("cancel while pending");
        assert_eq!(outcome.to, ChainState::Cancelled);

        let outcome = engine
            .apply(&ChainState::FirstApproved, &cancel)
            .expect("cancel after coordinator sign-off");
        assert_eq!(outcome.to, ChainState::Cancelled);

        let error = engine
            .apply(&ChainState::FinalApproved, &cancel)
            .expect_err("settled leave cannot be cancelled");
        assert!(matches!(error, ApprovalTransitionError::IllegalTransition { .. }));
    }

    #[test]
    fn audited_apply_records_both_outcomes() {
        let engine = ApprovalEngine::new(LeaveChain);
        let sink = InMemoryAuditSink::default();

        engine
            .apply_with_audit(
                "LR-1",
                &ChainState::Pending,
                &first_approve(Role::ProjectCoordinator),
                &sink,
            )
            .expect("transition applies");
        let _ = engine.apply_with_audit(
            "LR-1",
            &ChainState::Pending,
            &final_approve(Role::HrManager),
            &sink,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "approval.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("coordinator_approved"));
        assert_eq!(events[1].event_type, "approval.transition_refused");
    }

    #[test]
    fn replay_is_deterministic_for_same_event_sequence() {
        let engine = ApprovalEngine::new(FinanceChain);
        let events =
            [first_approve(Role::GeneralManager), final_approve(Role::Admin)];

        let run = || {
            let mut state = engine.initial_state();
            let mut path = Vec::new();
            for event in &events {
                let outcome = engine.apply(&state, event).expect("deterministic run");
                path.push(outcome.to);
                state = outcome.to;
            }
            path
        };

        assert_eq!(run(), run());
        assert_eq!(engine.kind(), ChainKind::Finance);
        assert_eq!(FinanceChain.kind(), ChainKind::Finance);
    }
}
