use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::project::ProjectId;
use crate::errors::DomainError;
use crate::validation::{require_positive, require_text, FieldErrors, Validate};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    PartiallyPaid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::PartiallyPaid => "partially_paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub client: String,
    pub project_id: Option<ProjectId>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub overdue_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::{Cancelled, Draft, Overdue, Paid, PartiallyPaid, Pending};
        matches!(
            (self.status, next),
            (Draft, Pending)
                | (Draft, Cancelled)
                | (Pending, Paid)
                | (Pending, PartiallyPaid)
                | (Pending, Overdue)
                | (Pending, Cancelled)
                | (PartiallyPaid, Paid)
                | (PartiallyPaid, Overdue)
                | (Overdue, Paid)
                | (Overdue, PartiallyPaid)
                | (Overdue, Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: InvoiceStatus) -> Result<(), DomainError> {
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                entity: "invoice",
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }

        self.status = next;
        match next {
            InvoiceStatus::Paid => self.paid_at = Some(Utc::now()),
            InvoiceStatus::Overdue => self.overdue_at = Some(Utc::now()),
            _ => {}
        }
        Ok(())
    }
}

impl Validate for Invoice {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "client", &self.client);
        require_positive(&mut errors, "amount", self.amount);
        errors.into_result()
    }
}
