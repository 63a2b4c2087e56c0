pub mod approvals;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use approvals::{
    ApprovalChain, ApprovalEngine, ApprovalEvent, ApprovalTransitionError, ChainKind, ChainState,
    FinanceChain, LeaveChain, StageApproval, TransitionOutcome,
};
pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, DEFAULT_DEMO_PASSWORD,
};
pub use domain::attendance::{AttendanceRecord, AttendanceStatus};
pub use domain::category::{Category, CategoryId, CategoryKind};
pub use domain::finance::{
    ClientPayment, FinancialTransaction, MonetaryRecord, PaymentMethod, PettyCash, Rejection,
    SalaryBreakdown, SalaryRecord, TransactionKind,
};
pub use domain::invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use domain::leave::{total_days_inclusive, LeaveRequest, LeaveRequestId};
pub use domain::notification::{Notification, NotificationId, NotificationKind};
pub use domain::project::{Project, ProjectId, ProjectStatus};
pub use domain::submission::{Review, ReviewStatus, WorkSubmission, WorkSubmissionId};
pub use domain::task::{Task, TaskId, TaskStatus};
pub use domain::user::{Role, User, UserId};
pub use errors::{DomainError, ServiceError};
pub use validation::{FieldErrors, Validate};
