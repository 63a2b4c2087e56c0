use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::task::TaskId;
use crate::domain::user::{Role, UserId};
use crate::errors::DomainError;
use crate::validation::{require_text, FieldErrors, Validate};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkSubmissionId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    PendingReview,
    Approved,
    NeedsRevision,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::NeedsRevision => "needs_revision",
            Self::Rejected => "rejected",
        }
    }
}

/// Reviewer verdict attached to a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewed_by: UserId,
    pub reviewer_role: Role,
    pub review_date: DateTime<Utc>,
    pub feedback: String,
    pub rejection_reason: Option<String>,
}

/// An employee's reported deliverable against a task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkSubmission {
    pub id: WorkSubmissionId,
    pub task_id: TaskId,
    pub employee_id: UserId,
    pub summary: String,
    pub attachment_url: Option<String>,
    pub status: ReviewStatus,
    pub review: Option<Review>,
    pub submitted_at: DateTime<Utc>,
}

impl WorkSubmission {
    pub fn can_transition_to(&self, next: ReviewStatus) -> bool {
        matches!(
            (self.status, next),
            (ReviewStatus::PendingReview, ReviewStatus::Approved)
                | (ReviewStatus::PendingReview, ReviewStatus::NeedsRevision)
                | (ReviewStatus::PendingReview, ReviewStatus::Rejected)
                | (ReviewStatus::NeedsRevision, ReviewStatus::PendingReview)
        )
    }

    pub fn transition_to(&mut self, next: ReviewStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidStatusTransition {
            entity: "work submission",
            from: self.status.as_str(),
            to: next.as_str(),
        })
    }
}

impl Validate for WorkSubmission {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "summary", &self.summary);
        errors.into_result()
    }
}
