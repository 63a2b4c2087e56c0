//! Workflow services. Every status change goes through the core
//! transition tables; the services add persistence, role gates, audit
//! emission, and notification fan-out.

pub mod attendance;
pub mod finance;
pub mod invoices;
pub mod leave;
pub mod notifications;
pub mod projects;
pub mod reviews;
pub mod tasks;

pub use attendance::AttendanceService;
pub use finance::FinanceService;
pub use invoices::InvoiceService;
pub use leave::LeaveService;
pub use notifications::NotificationService;
pub use projects::ProjectService;
pub use reviews::ReviewService;
pub use tasks::TaskService;

use opsdesk_core::{Notification, NotificationKind, Role, ServiceError, User, UserId};

use crate::repositories::{Repository, RepositoryError, Stores};

pub(crate) fn storage(error: RepositoryError) -> ServiceError {
    ServiceError::Storage(error.to_string())
}

pub(crate) fn ensure_role(user: &User, allowed: &[Role], action: &str) -> Result<(), ServiceError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    Err(ServiceError::Forbidden { action: action.to_owned(), role: user.role })
}

pub(crate) async fn notify_user(
    stores: &Stores,
    recipient: UserId,
    kind: NotificationKind,
    message: impl Into<String>,
) -> Result<(), ServiceError> {
    stores.notifications.save(Notification::new(recipient, kind, message)).await.map_err(storage)
}

/// One notification per active holder of the role.
pub(crate) async fn notify_role(
    stores: &Stores,
    role: Role,
    kind: NotificationKind,
    message: &str,
) -> Result<(), ServiceError> {
    let recipients = stores.users.list_where(|user| user.role == role && user.active).await;
    for user in recipients {
        notify_user(stores, user.id, kind, message).await?;
    }
    Ok(())
}
