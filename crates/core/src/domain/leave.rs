use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::approvals::{ChainState, StageApproval};
use crate::domain::category::CategoryId;
use crate::domain::finance::Rejection;
use crate::domain::user::UserId;
use crate::errors::DomainError;
use crate::validation::{require_date_order, require_text, FieldErrors, Validate};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveRequestId(pub String);

/// Inclusive day count between two dates: both endpoints count, so a
/// single-day request is 1. No timezone or business-day handling.
pub fn total_days_inclusive(start: NaiveDate, end: NaiveDate) -> Result<i64, DomainError> {
    if end < start {
        return Err(DomainError::InvariantViolation(format!(
            "leave period ends ({end}) before it starts ({start})"
        )));
    }
    Ok((end - start).num_days() + 1)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: UserId,
    pub leave_type: CategoryId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub total_days: i64,
    pub status: ChainState,
    pub coordinator_approval: Option<StageApproval>,
    pub hr_approval: Option<StageApproval>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
}

impl Validate for LeaveRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "reason", &self.reason);
        require_date_order(&mut errors, "end_date", self.start_date, self.end_date);
        errors.into_result()
    }
}
