//! Deterministic demo dataset: one user per role plus the demo
//! employee, settings categories, a project with tasks, and one record
//! per workflow so every screenful of the system has something to show.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use opsdesk_core::{
    AttendanceRecord, AttendanceStatus, Category, CategoryId, CategoryKind, ChainState,
    ClientPayment, FinancialTransaction, Invoice, InvoiceId, InvoiceStatus, LeaveRequest,
    LeaveRequestId, Notification, NotificationKind, PaymentMethod, PettyCash, Project, ProjectId,
    ProjectStatus, ReviewStatus, Role, SalaryBreakdown, SalaryRecord, ServiceError, Task, TaskId,
    TaskStatus, TransactionKind, User, UserId, WorkSubmission, WorkSubmissionId,
};

use crate::repositories::{Repository, Stores};
use crate::services::storage;

const SEED_USER_IDS: &[&str] = &["u-admin", "u-grace", "u-hana", "u-cora", "u-dana"];
const SEED_CATEGORY_IDS: &[&str] = &["cat-travel", "leave-annual", "dept-design"];

pub struct DemoDataset;

#[derive(Debug)]
pub struct SeedSummary {
    pub users: usize,
    pub categories: usize,
    pub workflow_records: usize,
}

/// One labelled verification result, `ok == false` meaning the seeded
/// state no longer matches the contract.
#[derive(Debug)]
pub struct FixtureCheck {
    pub label: &'static str,
    pub ok: bool,
}

impl DemoDataset {
    fn seeded_at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).single().unwrap_or_else(Utc::now)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    /// The full mock directory, one account per role.
    pub fn demo_users() -> Vec<User> {
        let user = |id: &str, username: &str, display: &str, role| User {
            id: UserId(id.to_owned()),
            username: username.to_owned(),
            display_name: display.to_owned(),
            email: format!("{username}@agency.test"),
            role,
            active: true,
        };
        vec![
            user("u-admin", "admin", "Site Admin", Role::Admin),
            user("u-grace", "grace", "Grace Okafor", Role::GeneralManager),
            user("u-hana", "hana", "Hana Suzuki", Role::HrManager),
            user("u-cora", "cora", "Cora Lindqvist", Role::ProjectCoordinator),
            user("u-dana", "dana", "Dana Farkas", Role::Employee),
        ]
    }

    fn categories() -> Vec<Category> {
        let category = |id: &str, name: &str, kind| Category {
            id: CategoryId(id.to_owned()),
            name: name.to_owned(),
            kind,
            active: true,
        };
        vec![
            category("cat-travel", "Travel", CategoryKind::ExpenseCategory),
            category("leave-annual", "Annual Leave", CategoryKind::LeaveType),
            category("dept-design", "Design", CategoryKind::Department),
        ]
    }

    pub async fn load(stores: &Stores) -> Result<SeedSummary, ServiceError> {
        let at = Self::seeded_at();
        let dana = UserId("u-dana".to_owned());

        let users = Self::demo_users();
        for user in &users {
            stores.users.save(user.clone()).await.map_err(storage)?;
        }

        let categories = Self::categories();
        for category in &categories {
            stores.categories.save(category.clone()).await.map_err(storage)?;
        }

        stores
            .projects
            .save(Project {
                id: ProjectId("P-ACME-SITE".to_owned()),
                name: "Acme website refresh".to_owned(),
                client: "Acme Studios".to_owned(),
                description: Some("Full redesign of the marketing site".to_owned()),
                coordinator: Some(UserId("u-cora".to_owned())),
                start_date: Some(Self::date(2024, 3, 4)),
                deadline: Some(Self::date(2024, 6, 28)),
                status: ProjectStatus::InProgress,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        let task = |id: &str, title: &str, status| Task {
            id: TaskId(id.to_owned()),
            project_id: ProjectId("P-ACME-SITE".to_owned()),
            title: title.to_owned(),
            description: None,
            assignee: Some(dana.clone()),
            due_date: Some(Self::date(2024, 4, 12)),
            status,
            completed_at: None,
            created_at: at,
        };
        stores
            .tasks
            .save(task("T-COPY", "Draft homepage copy", TaskStatus::InProgress))
            .await
            .map_err(storage)?;
        stores
            .tasks
            .save(task("T-WIREFRAME", "Wireframe the landing page", TaskStatus::Pending))
            .await
            .map_err(storage)?;

        stores
            .invoices
            .save(Invoice {
                id: InvoiceId("INV-2024-001".to_owned()),
                client: "Acme Studios".to_owned(),
                project_id: Some(ProjectId("P-ACME-SITE".to_owned())),
                amount: Decimal::new(12_000, 0),
                due_date: Self::date(2024, 4, 30),
                status: InvoiceStatus::Pending,
                paid_at: None,
                overdue_at: None,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .transactions
            .save(FinancialTransaction {
                id: "TXN-0001".to_owned(),
                kind: TransactionKind::Expense,
                category: CategoryId("cat-travel".to_owned()),
                description: "Client kickoff travel".to_owned(),
                amount: Decimal::new(350, 0),
                incurred_on: Self::date(2024, 3, 5),
                submitted_by: dana.clone(),
                status: ChainState::Pending,
                gm_approval: None,
                admin_approval: None,
                rejection: None,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .client_payments
            .save(ClientPayment {
                id: "PAY-0001".to_owned(),
                client: "Acme Studios".to_owned(),
                invoice_id: Some(InvoiceId("INV-2024-001".to_owned())),
                amount: Decimal::new(6_000, 0),
                method: PaymentMethod::BankTransfer,
                received_on: Self::date(2024, 3, 15),
                submitted_by: dana.clone(),
                status: ChainState::Pending,
                gm_approval: None,
                admin_approval: None,
                rejection: None,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .salaries
            .save(SalaryRecord {
                id: "SAL-2024-02-dana".to_owned(),
                employee_id: dana.clone(),
                period: "2024-02".to_owned(),
                breakdown: SalaryBreakdown {
                    base: Decimal::new(7_500, 0),
                    overtime: Decimal::new(500, 0),
                    bonuses: Decimal::new(1_000, 0),
                    allowances: Decimal::ZERO,
                    deductions: Decimal::new(800, 0),
                },
                submitted_by: UserId("u-hana".to_owned()),
                status: ChainState::Pending,
                gm_approval: None,
                admin_approval: None,
                rejection: None,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .petty_cash
            .save(PettyCash {
                id: "PC-0001".to_owned(),
                purpose: "Office supplies".to_owned(),
                amount: Decimal::new(85, 0),
                spent_on: Self::date(2024, 3, 8),
                receipt_note: Some("stationer receipt #4411".to_owned()),
                submitted_by: dana.clone(),
                status: ChainState::Pending,
                gm_approval: None,
                admin_approval: None,
                rejection: None,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .leave_requests
            .save(LeaveRequest {
                id: LeaveRequestId("LR-0001".to_owned()),
                employee_id: dana.clone(),
                leave_type: CategoryId("leave-annual".to_owned()),
                start_date: Self::date(2024, 4, 1),
                end_date: Self::date(2024, 4, 3),
                reason: "Family visit".to_owned(),
                total_days: 3,
                status: ChainState::Pending,
                coordinator_approval: None,
                hr_approval: None,
                rejection: None,
                created_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .submissions
            .save(WorkSubmission {
                id: WorkSubmissionId("WS-0001".to_owned()),
                task_id: TaskId("T-COPY".to_owned()),
                employee_id: dana.clone(),
                summary: "First pass at the homepage copy".to_owned(),
                attachment_url: Some("https://files.agency.test/ws-0001".to_owned()),
                status: ReviewStatus::PendingReview,
                review: None,
                submitted_at: at,
            })
            .await
            .map_err(storage)?;

        stores
            .attendance
            .save(AttendanceRecord {
                id: "ATT-u-dana-2024-03-04".to_owned(),
                employee_id: dana.clone(),
                date: Self::date(2024, 3, 4),
                check_in: chrono::NaiveTime::from_hms_opt(9, 0, 0),
                check_out: chrono::NaiveTime::from_hms_opt(17, 30, 0),
                status: AttendanceStatus::Present,
                notes: None,
                location: Some("studio".to_owned()),
            })
            .await
            .map_err(storage)?;

        stores
            .notifications
            .save(Notification::new(
                dana,
                NotificationKind::System,
                "Welcome to the demo workspace",
            ))
            .await
            .map_err(storage)?;

        Ok(SeedSummary {
            users: users.len(),
            categories: categories.len(),
            workflow_records: 10,
        })
    }

    /// Labelled contract checks over the seeded state.
    pub async fn verify(stores: &Stores) -> Result<Vec<FixtureCheck>, ServiceError> {
        let mut checks = Vec::new();
        let mut push = |label: &'static str, ok: bool| checks.push(FixtureCheck { label, ok });

        let users = stores.users.list().await.map_err(storage)?;
        push(
            "directory-complete",
            SEED_USER_IDS.iter().all(|id| users.iter().any(|u| u.id.0 == *id)),
        );
        push("one-user-per-role", {
            let mut roles: Vec<Role> = users.iter().map(|u| u.role).collect();
            roles.sort_by_key(|r| r.as_str());
            roles.dedup();
            roles.len() == 5
        });

        let categories = stores.categories.list().await.map_err(storage)?;
        push(
            "categories-active",
            SEED_CATEGORY_IDS
                .iter()
                .all(|id| categories.iter().any(|c| c.id.0 == *id && c.active)),
        );

        let project = stores.projects.find_by_id("P-ACME-SITE").await.map_err(storage)?;
        push(
            "project-in-progress",
            project.as_ref().is_some_and(|p| p.status == ProjectStatus::InProgress),
        );
        push(
            "project-has-coordinator",
            project.is_some_and(|p| p.coordinator == Some(UserId("u-cora".to_owned()))),
        );
        push(
            "project-tasks",
            stores.tasks.list_where(|t| t.project_id.0 == "P-ACME-SITE").await.len() == 2,
        );

        push(
            "invoice-pending",
            stores
                .invoices
                .find_by_id("INV-2024-001")
                .await
                .map_err(storage)?
                .is_some_and(|i| i.status == InvoiceStatus::Pending),
        );

        push(
            "transaction-awaits-gm",
            stores
                .transactions
                .find_by_id("TXN-0001")
                .await
                .map_err(storage)?
                .is_some_and(|t| t.status == ChainState::Pending),
        );
        push(
            "payment-seeded",
            stores.client_payments.find_by_id("PAY-0001").await.map_err(storage)?.is_some(),
        );
        push(
            "salary-nets-8200",
            stores
                .salaries
                .find_by_id("SAL-2024-02-dana")
                .await
                .map_err(storage)?
                .is_some_and(|s| s.net() == Decimal::new(8_200, 0)),
        );
        push(
            "petty-cash-seeded",
            stores.petty_cash.find_by_id("PC-0001").await.map_err(storage)?.is_some(),
        );

        push(
            "leave-request-three-days",
            stores
                .leave_requests
                .find_by_id("LR-0001")
                .await
                .map_err(storage)?
                .is_some_and(|r| r.total_days == 3 && r.status == ChainState::Pending),
        );
        push(
            "submission-awaits-review",
            stores
                .submissions
                .find_by_id("WS-0001")
                .await
                .map_err(storage)?
                .is_some_and(|s| s.status == ReviewStatus::PendingReview),
        );
        push(
            "attendance-day-recorded",
            stores
                .attendance
                .find_by_id("ATT-u-dana-2024-03-04")
                .await
                .map_err(storage)?
                .is_some_and(|a| a.status == AttendanceStatus::Present),
        );
        push("welcome-notification", !stores.notifications.is_empty().await);

        Ok(checks)
    }
}
