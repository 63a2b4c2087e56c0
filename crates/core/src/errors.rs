use thiserror::Error;

use crate::approvals::ApprovalTransitionError;
use crate::domain::user::Role;
use crate::validation::FieldErrors;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {entity} transition from `{from}` to `{to}`")]
    InvalidStatusTransition { entity: &'static str, from: &'static str, to: &'static str },
    #[error(transparent)]
    ApprovalTransition(#[from] ApprovalTransitionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures surfaced by the workflow services in `opsdesk-store`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("role `{role}` may not {action}")]
    Forbidden { action: String, role: Role },
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<ApprovalTransitionError> for ServiceError {
    fn from(error: ApprovalTransitionError) -> Self {
        Self::Domain(DomainError::ApprovalTransition(error))
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
