use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use opsdesk_core::{
    AttendanceRecord, Category, ClientPayment, FinancialTransaction, InMemoryAuditSink, Invoice,
    LeaveRequest, Notification, PettyCash, Project, SalaryRecord, Task, User, WorkSubmission,
};

pub mod memory;

pub use memory::InMemoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Anything the repositories can hold. The id doubles as the map key, so
/// it must be stable for the lifetime of the record.
pub trait StoreRecord: Clone + Send + Sync + 'static {
    fn record_id(&self) -> &str;
}

#[async_trait]
pub trait Repository<T: StoreRecord>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, RepositoryError>;
    async fn save(&self, record: T) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;
    async fn list(&self) -> Result<Vec<T>, RepositoryError>;
}

impl StoreRecord for User {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for Project {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for Task {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for WorkSubmission {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for LeaveRequest {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for AttendanceRecord {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for Invoice {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for FinancialTransaction {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for ClientPayment {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for SalaryRecord {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for PettyCash {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for Notification {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

impl StoreRecord for Category {
    fn record_id(&self) -> &str {
        &self.id.0
    }
}

/// Every repository the services operate over, plus the shared audit
/// sink. Cheap to clone; all stores are shared behind `Arc`.
#[derive(Clone, Default)]
pub struct Stores {
    pub users: Arc<InMemoryRepository<User>>,
    pub projects: Arc<InMemoryRepository<Project>>,
    pub tasks: Arc<InMemoryRepository<Task>>,
    pub submissions: Arc<InMemoryRepository<WorkSubmission>>,
    pub leave_requests: Arc<InMemoryRepository<LeaveRequest>>,
    pub attendance: Arc<InMemoryRepository<AttendanceRecord>>,
    pub invoices: Arc<InMemoryRepository<Invoice>>,
    pub transactions: Arc<InMemoryRepository<FinancialTransaction>>,
    pub client_payments: Arc<InMemoryRepository<ClientPayment>>,
    pub salaries: Arc<InMemoryRepository<SalaryRecord>>,
    pub petty_cash: Arc<InMemoryRepository<PettyCash>>,
    pub notifications: Arc<InMemoryRepository<Notification>>,
    pub categories: Arc<InMemoryRepository<Category>>,
    pub audit: Arc<InMemoryAuditSink>,
}
