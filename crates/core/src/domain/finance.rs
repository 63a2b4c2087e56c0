//! Monetary records: all four share the GM-then-admin approval chain
//! and the same sign-off metadata.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::approvals::{ChainState, StageApproval};
use crate::domain::category::CategoryId;
use crate::domain::invoice::InvoiceId;
use crate::domain::user::UserId;
use crate::validation::{
    require_non_negative, require_positive, require_text, FieldErrors, Validate,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    Cheque,
    Card,
}

/// Terminal refusal of a monetary record; the reason is mandatory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub by: UserId,
    pub at: DateTime<Utc>,
    pub reason: String,
}

/// Salary components; every field defaults to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub base: Decimal,
    pub overtime: Decimal,
    pub bonuses: Decimal,
    pub allowances: Decimal,
    pub deductions: Decimal,
}

impl SalaryBreakdown {
    /// `base + overtime + bonuses + allowances - deductions`.
    pub fn net(&self) -> Decimal {
        self.base + self.overtime + self.bonuses + self.allowances - self.deductions
    }
}

/// Shared surface of the four monetary record types, letting one
/// approval workflow drive all of them.
pub trait MonetaryRecord {
    const ENTITY: &'static str;

    fn record_id(&self) -> &str;
    fn submitted_by(&self) -> &UserId;
    fn state(&self) -> ChainState;
    fn set_state(&mut self, state: ChainState);
    fn record_first_approval(&mut self, stage: StageApproval);
    fn record_final_approval(&mut self, stage: StageApproval);
    fn record_rejection(&mut self, rejection: Rejection);
}

macro_rules! monetary_record_impl {
    ($ty:ty, $entity:literal) => {
        impl MonetaryRecord for $ty {
            const ENTITY: &'static str = $entity;

            fn record_id(&self) -> &str {
                &self.id
            }

            fn submitted_by(&self) -> &UserId {
                &self.submitted_by
            }

            fn state(&self) -> ChainState {
                self.status
            }

            fn set_state(&mut self, state: ChainState) {
                self.status = state;
            }

            fn record_first_approval(&mut self, stage: StageApproval) {
                self.gm_approval = Some(stage);
            }

            fn record_final_approval(&mut self, stage: StageApproval) {
                self.admin_approval = Some(stage);
            }

            fn record_rejection(&mut self, rejection: Rejection) {
                self.rejection = Some(rejection);
            }
        }
    };
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub category: CategoryId,
    pub description: String,
    pub amount: Decimal,
    pub incurred_on: NaiveDate,
    pub submitted_by: UserId,
    pub status: ChainState,
    pub gm_approval: Option<StageApproval>,
    pub admin_approval: Option<StageApproval>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
}

monetary_record_impl!(FinancialTransaction, "financial transaction");

impl Validate for FinancialTransaction {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "description", &self.description);
        require_positive(&mut errors, "amount", self.amount);
        errors.into_result()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientPayment {
    pub id: String,
    pub client: String,
    pub invoice_id: Option<InvoiceId>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub received_on: NaiveDate,
    pub submitted_by: UserId,
    pub status: ChainState,
    pub gm_approval: Option<StageApproval>,
    pub admin_approval: Option<StageApproval>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
}

monetary_record_impl!(ClientPayment, "client payment");

impl Validate for ClientPayment {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "client", &self.client);
        require_positive(&mut errors, "amount", self.amount);
        errors.into_result()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    pub id: String,
    pub employee_id: UserId,
    /// Payroll period as `YYYY-MM`.
    pub period: String,
    pub breakdown: SalaryBreakdown,
    pub submitted_by: UserId,
    pub status: ChainState,
    pub gm_approval: Option<StageApproval>,
    pub admin_approval: Option<StageApproval>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
}

impl SalaryRecord {
    pub fn net(&self) -> Decimal {
        self.breakdown.net()
    }
}

monetary_record_impl!(SalaryRecord, "salary record");

impl Validate for SalaryRecord {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "period", &self.period);
        require_positive(&mut errors, "base", self.breakdown.base);
        require_non_negative(&mut errors, "overtime", self.breakdown.overtime);
        require_non_negative(&mut errors, "bonuses", self.breakdown.bonuses);
        require_non_negative(&mut errors, "allowances", self.breakdown.allowances);
        require_non_negative(&mut errors, "deductions", self.breakdown.deductions);
        errors.into_result()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PettyCash {
    pub id: String,
    pub purpose: String,
    pub amount: Decimal,
    pub spent_on: NaiveDate,
    pub receipt_note: Option<String>,
    pub submitted_by: UserId,
    pub status: ChainState,
    pub gm_approval: Option<StageApproval>,
    pub admin_approval: Option<StageApproval>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
}

monetary_record_impl!(PettyCash, "petty cash");

impl Validate for PettyCash {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "purpose", &self.purpose);
        require_positive(&mut errors, "amount", self.amount);
        errors.into_result()
    }
}
