//! Two-stage approval chains with enforced transitions.
//!
//! The dashboards this replaces wrote status strings straight from UI
//! handlers; here every move goes through a transition table and an
//! illegal move comes back as a typed error.

mod engine;
mod states;

pub use engine::{
    ApprovalChain, ApprovalEngine, ApprovalTransitionError, ChainConfig, FinanceChain, LeaveChain,
};
pub use states::{ApprovalEvent, ChainKind, ChainState, StageApproval, TransitionOutcome};
