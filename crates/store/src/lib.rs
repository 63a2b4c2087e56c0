//! Storage and service layer: in-memory repositories, the mocked login
//! flow, CSV attendance import, demo fixtures, and the workflow services
//! that drive the core state machines.

pub mod attendance_import;
pub mod auth;
pub mod fixtures;
pub mod repositories;
pub mod services;
pub mod session;

pub use attendance_import::{
    import_attendance_csv, AttendanceImportError, AttendanceImportReport, ImportRowError,
};
pub use auth::{require_role, AuthError, AuthService};
pub use fixtures::{DemoDataset, FixtureCheck, SeedSummary};
pub use repositories::{InMemoryRepository, Repository, RepositoryError, StoreRecord, Stores};
pub use services::{
    AttendanceService, FinanceService, InvoiceService, LeaveService, NotificationService,
    ProjectService, ReviewService, TaskService,
};
pub use session::{
    FileSessionStore, InMemorySessionStore, SessionError, SessionRecord, SessionStore,
};
