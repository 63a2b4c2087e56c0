use chrono::Utc;
use tracing::info;

use opsdesk_core::{
    total_days_inclusive, ApprovalEngine, ApprovalEvent, LeaveChain, LeaveRequest,
    NotificationKind, Rejection, Role, ServiceError, User, Validate,
};

use crate::repositories::{Repository, Stores};

use super::{notify_role, notify_user, storage};

/// Coordinator-then-HR chain for leave requests. Only the requester may
/// cancel, and only before the request settles.
pub struct LeaveService {
    stores: Stores,
    engine: ApprovalEngine<LeaveChain>,
}

impl LeaveService {
    pub fn new(stores: Stores) -> Self {
        Self { stores, engine: ApprovalEngine::new(LeaveChain) }
    }

    async fn load(&self, id: &str) -> Result<LeaveRequest, ServiceError> {
        self.stores
            .leave_requests
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "leave request", id: id.to_owned() })
    }

    /// Validates the request, derives the inclusive day count, and
    /// parks it pending coordinator review.
    pub async fn submit(&self, mut request: LeaveRequest) -> Result<LeaveRequest, ServiceError> {
        request.validate()?;
        request.total_days = total_days_inclusive(request.start_date, request.end_date)
            .map_err(ServiceError::from)?;
        request.status = self.engine.initial_state();
        self.stores.leave_requests.save(request.clone()).await.map_err(storage)?;

        info!(
            id = %request.id.0,
            employee = %request.employee_id.0,
            days = request.total_days,
            "leave request submitted"
        );
        notify_role(
            &self.stores,
            Role::ProjectCoordinator,
            NotificationKind::ApprovalRequested,
            &format!("Leave request `{}` awaits coordinator review", request.id.0),
        )
        .await?;
        Ok(request)
    }

    pub async fn coordinator_approve(
        &self,
        id: &str,
        actor: &User,
        comments: Option<String>,
    ) -> Result<LeaveRequest, ServiceError> {
        let mut request = self.load(id).await?;
        let event = ApprovalEvent::FirstApprove {
            actor: actor.id.clone(),
            actor_role: actor.role,
            comments,
        };
        let outcome =
            self.engine.apply_with_audit(id, &request.status, &event, &*self.stores.audit)?;

        request.status = outcome.to;
        request.coordinator_approval = outcome.recorded;
        self.stores.leave_requests.save(request.clone()).await.map_err(storage)?;

        notify_role(
            &self.stores,
            Role::HrManager,
            NotificationKind::ApprovalRequested,
            &format!("Leave request `{id}` cleared the coordinator and awaits HR"),
        )
        .await?;
        Ok(request)
    }

    pub async fn hr_approve(
        &self,
        id: &str,
        actor: &User,
        comments: Option<String>,
    ) -> Result<LeaveRequest, ServiceError> {
        let mut request = self.load(id).await?;
        let event = ApprovalEvent::FinalApprove {
            actor: actor.id.clone(),
            actor_role: actor.role,
            comments,
        };
        let outcome =
            self.engine.apply_with_audit(id, &request.status, &event, &*self.stores.audit)?;

        request.status = outcome.to;
        request.hr_approval = outcome.recorded;
        self.stores.leave_requests.save(request.clone()).await.map_err(storage)?;

        notify_user(
            &self.stores,
            request.employee_id.clone(),
            NotificationKind::LeaveDecision,
            format!("Your leave request `{id}` is approved ({} days)", request.total_days),
        )
        .await?;
        Ok(request)
    }

    pub async fn reject(
        &self,
        id: &str,
        actor: &User,
        reason: &str,
    ) -> Result<LeaveRequest, ServiceError> {
        let mut request = self.load(id).await?;
        let event = ApprovalEvent::Reject {
            actor: actor.id.clone(),
            actor_role: actor.role,
            reason: reason.to_owned(),
        };
        let outcome =
            self.engine.apply_with_audit(id, &request.status, &event, &*self.stores.audit)?;

        request.status = outcome.to;
        request.rejection = Some(Rejection {
            by: actor.id.clone(),
            at: Utc::now(),
            reason: reason.to_owned(),
        });
        self.stores.leave_requests.save(request.clone()).await.map_err(storage)?;

        notify_user(
            &self.stores,
            request.employee_id.clone(),
            NotificationKind::LeaveDecision,
            format!("Your leave request `{id}` was rejected: {reason}"),
        )
        .await?;
        Ok(request)
    }

    /// Withdrawal by the requester; anyone else is refused before the
    /// chain is even consulted.
    pub async fn cancel(&self, id: &str, actor: &User) -> Result<LeaveRequest, ServiceError> {
        let mut request = self.load(id).await?;
        if request.employee_id != actor.id {
            return Err(ServiceError::Forbidden {
                action: "cancel another employee's leave request".to_owned(),
                role: actor.role,
            });
        }

        let event = ApprovalEvent::Cancel { actor: actor.id.clone() };
        let outcome =
            self.engine.apply_with_audit(id, &request.status, &event, &*self.stores.audit)?;

        request.status = outcome.to;
        self.stores.leave_requests.save(request.clone()).await.map_err(storage)?;
        info!(id, employee = %actor.username, "leave request cancelled");
        Ok(request)
    }

    pub async fn for_employee(&self, employee_id: &str) -> Vec<LeaveRequest> {
        self.stores.leave_requests.list_where(|r| r.employee_id.0 == employee_id).await
    }
}
