use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::errors::DomainError;
use crate::validation::{require_text, FieldErrors, Validate};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub client: String,
    pub description: Option<String>,
    pub coordinator: Option<UserId>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        matches!(
            (self.status, next),
            (ProjectStatus::Planning, ProjectStatus::InProgress)
                | (ProjectStatus::InProgress, ProjectStatus::OnHold)
                | (ProjectStatus::InProgress, ProjectStatus::Completed)
                | (ProjectStatus::OnHold, ProjectStatus::InProgress)
        )
    }

    pub fn transition_to(&mut self, next: ProjectStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidStatusTransition {
            entity: "project",
            from: self.status.as_str(),
            to: next.as_str(),
        })
    }
}

impl Validate for Project {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name);
        require_text(&mut errors, "client", &self.client);
        if let (Some(start), Some(deadline)) = (self.start_date, self.deadline) {
            if deadline < start {
                errors.add("deadline", "must not be before the start date");
            }
        }
        errors.into_result()
    }
}
