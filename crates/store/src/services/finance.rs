use chrono::Utc;
use tracing::info;

use opsdesk_core::{
    ApprovalEngine, ApprovalEvent, FinanceChain, MonetaryRecord, NotificationKind, Rejection, Role,
    ServiceError, User, Validate,
};

use crate::repositories::{InMemoryRepository, Repository, StoreRecord, Stores};

use super::{ensure_role, notify_role, notify_user, storage};

/// Drives the GM-then-admin chain for all four monetary entities. The
/// caller picks the repository; the record type carries everything else.
pub struct FinanceService {
    stores: Stores,
    engine: ApprovalEngine<FinanceChain>,
}

impl FinanceService {
    pub fn new(stores: Stores) -> Self {
        Self { stores, engine: ApprovalEngine::default() }
    }

    async fn load<T>(&self, repo: &InMemoryRepository<T>, id: &str) -> Result<T, ServiceError>
    where
        T: MonetaryRecord + StoreRecord,
    {
        repo.find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: T::ENTITY, id: id.to_owned() })
    }

    pub async fn submit<T>(
        &self,
        repo: &InMemoryRepository<T>,
        mut record: T,
        actor: &User,
    ) -> Result<T, ServiceError>
    where
        T: MonetaryRecord + StoreRecord + Validate,
    {
        record.validate()?;
        record.set_state(self.engine.initial_state());
        repo.save(record.clone()).await.map_err(storage)?;

        let id = MonetaryRecord::record_id(&record).to_owned();
        info!(entity = T::ENTITY, id, actor = %actor.username, "monetary record submitted");
        notify_role(
            &self.stores,
            Role::GeneralManager,
            NotificationKind::ApprovalRequested,
            &format!("{} `{id}` awaits GM approval", T::ENTITY),
        )
        .await?;
        Ok(record)
    }

    pub async fn gm_approve<T>(
        &self,
        repo: &InMemoryRepository<T>,
        id: &str,
        actor: &User,
        comments: Option<String>,
    ) -> Result<T, ServiceError>
    where
        T: MonetaryRecord + StoreRecord,
    {
        let mut record = self.load(repo, id).await?;
        let event = ApprovalEvent::FirstApprove {
            actor: actor.id.clone(),
            actor_role: actor.role,
            comments,
        };
        let outcome =
            self.engine.apply_with_audit(id, &record.state(), &event, &*self.stores.audit)?;

        record.set_state(outcome.to);
        if let Some(stage) = outcome.recorded {
            record.record_first_approval(stage);
        }
        repo.save(record.clone()).await.map_err(storage)?;

        notify_role(
            &self.stores,
            Role::Admin,
            NotificationKind::ApprovalRequested,
            &format!("{} `{id}` cleared GM review and awaits admin approval", T::ENTITY),
        )
        .await?;
        Ok(record)
    }

    pub async fn admin_approve<T>(
        &self,
        repo: &InMemoryRepository<T>,
        id: &str,
        actor: &User,
        comments: Option<String>,
    ) -> Result<T, ServiceError>
    where
        T: MonetaryRecord + StoreRecord,
    {
        let mut record = self.load(repo, id).await?;
        let event = ApprovalEvent::FinalApprove {
            actor: actor.id.clone(),
            actor_role: actor.role,
            comments,
        };
        let outcome =
            self.engine.apply_with_audit(id, &record.state(), &event, &*self.stores.audit)?;

        record.set_state(outcome.to);
        if let Some(stage) = outcome.recorded {
            record.record_final_approval(stage);
        }
        repo.save(record.clone()).await.map_err(storage)?;

        notify_user(
            &self.stores,
            record.submitted_by().clone(),
            NotificationKind::ApprovalGranted,
            format!("Your {} `{id}` is fully approved", T::ENTITY),
        )
        .await?;
        Ok(record)
    }

    pub async fn reject<T>(
        &self,
        repo: &InMemoryRepository<T>,
        id: &str,
        actor: &User,
        reason: &str,
    ) -> Result<T, ServiceError>
    where
        T: MonetaryRecord + StoreRecord,
    {
        let mut record = self.load(repo, id).await?;
        let event = ApprovalEvent::Reject {
            actor: actor.id.clone(),
            actor_role: actor.role,
            reason: reason.to_owned(),
        };
        let outcome =
            self.engine.apply_with_audit(id, &record.state(), &event, &*self.stores.audit)?;

        record.set_state(outcome.to);
        record.record_rejection(Rejection {
            by: actor.id.clone(),
            at: Utc::now(),
            reason: reason.to_owned(),
        });
        repo.save(record.clone()).await.map_err(storage)?;

        notify_user(
            &self.stores,
            record.submitted_by().clone(),
            NotificationKind::ApprovalRejected,
            format!("Your {} `{id}` was rejected: {reason}", T::ENTITY),
        )
        .await?;
        Ok(record)
    }

    pub async fn delete<T>(
        &self,
        repo: &InMemoryRepository<T>,
        id: &str,
        actor: &User,
    ) -> Result<(), ServiceError>
    where
        T: MonetaryRecord + StoreRecord,
    {
        ensure_role(actor, &[Role::Admin, Role::GeneralManager], "delete financial records")?;
        let removed = repo.delete(id).await.map_err(storage)?;
        if !removed {
            return Err(ServiceError::NotFound { entity: T::ENTITY, id: id.to_owned() });
        }
        info!(entity = T::ENTITY, id, actor = %actor.username, "monetary record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use opsdesk_core::{
        ApprovalTransitionError, CategoryId, ChainState, DomainError, FinancialTransaction,
        NotificationKind, Role, ServiceError, TransactionKind, User, UserId,
    };

    use crate::repositories::Stores;

    use super::FinanceService;

    fn user(name: &str, role: Role) -> User {
        User {
            id: UserId(format!("u-{name}")),
            username: name.to_owned(),
            display_name: name.to_owned(),
            email: format!("{name}@agency.test"),
            role,
            active: true,
        }
    }

    fn transaction(id: &str) -> FinancialTransaction {
        FinancialTransaction {
            id: id.to_owned(),
            kind: TransactionKind::Expense,
            category: CategoryId("cat-travel".to_owned()),
            description: "Client site travel".to_owned(),
            amount: Decimal::new(350, 0),
            incurred_on: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            submitted_by: UserId("u-dana".to_owned()),
            status: ChainState::Pending,
            gm_approval: None,
            admin_approval: None,
            rejection: None,
            created_at: Utc::now(),
        }
    }

    async fn seeded() -> (Stores, FinanceService) {
        use crate::repositories::Repository;
        let stores = Stores::default();
        for user in [
            user("dana", Role::Employee),
            user("grace", Role::GeneralManager),
            user("root", Role::Admin),
        ] {
            stores.users.save(user).await.expect("seed user");
        }
        let service = FinanceService::new(stores.clone());
        (stores, service)
    }

    #[tokio::test]
    async fn full_chain_stamps_both_approvals() {
        let (stores, service) = seeded().await;
        let gm = user("grace", Role::GeneralManager);
        let admin = user("root", Role::Admin);

        service
            .submit(&stores.transactions, transaction("TXN-1"), &user("dana", Role::Employee))
            .await
            .expect("submit");
        service
            .gm_approve(&stores.transactions, "TXN-1", &gm, Some("within budget".to_owned()))
            .await
            .expect("gm approval");
        let settled = service
            .admin_approve(&stores.transactions, "TXN-1", &admin, None)
            .await
            .expect("admin approval");

        assert_eq!(settled.status, ChainState::FinalApproved);
        assert_eq!(
            settled.gm_approval.as_ref().map(|s| s.by.clone()),
            Some(UserId("u-grace".to_owned()))
        );
        assert_eq!(
            settled.gm_approval.and_then(|s| s.comments),
            Some("within budget".to_owned())
        );
        assert!(settled.admin_approval.is_some());

        let granted = stores
            .notifications
            .list_where(|n| n.kind == NotificationKind::ApprovalGranted)
            .await;
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].recipient, UserId("u-dana".to_owned()));
    }

    #[tokio::test]
    async fn admin_cannot_jump_the_queue() {
        let (stores, service) = seeded().await;
        service
            .submit(&stores.transactions, transaction("TXN-2"), &user("dana", Role::Employee))
            .await
            .expect("submit");

        let error = service
            .admin_approve(&stores.transactions, "TXN-2", &user("root", Role::Admin), None)
            .await
            .expect_err("admin before GM");
        assert!(matches!(
            error,
            ServiceError::Domain(DomainError::ApprovalTransition(
                ApprovalTransitionError::OutOfOrderApproval { .. }
            ))
        ));

        let refused = stores
            .audit
            .events()
            .into_iter()
            .filter(|e| e.event_type == "approval.transition_refused")
            .count();
        assert_eq!(refused, 1);
    }

    #[tokio::test]
    async fn rejection_stamps_actor_and_reason() {
        let (stores, service) = seeded().await;
        service
            .submit(&stores.transactions, transaction("TXN-3"), &user("dana", Role::Employee))
            .await
            .expect("submit");

        let rejected = service
            .reject(
                &stores.transactions,
                "TXN-3",
                &user("grace", Role::GeneralManager),
                "duplicate claim",
            )
            .await
            .expect("rejection");

        assert_eq!(rejected.status, ChainState::Rejected);
        let rejection = rejected.rejection.expect("rejection stamped");
        assert_eq!(rejection.by, UserId("u-grace".to_owned()));
        assert_eq!(rejection.reason, "duplicate claim");

        let notices = stores
            .notifications
            .list_where(|n| n.kind == NotificationKind::ApprovalRejected)
            .await;
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].message,
            "Your financial transaction `TXN-3` was rejected: duplicate claim"
        );
    }

    #[tokio::test]
    async fn submit_refuses_invalid_records() {
        let (stores, service) = seeded().await;
        let mut bad = transaction("TXN-4");
        bad.amount = Decimal::ZERO;

        let error = service
            .submit(&stores.transactions, bad, &user("dana", Role::Employee))
            .await
            .expect_err("zero amount");
        assert!(matches!(error, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_is_gated_to_admin_and_gm() {
        let (stores, service) = seeded().await;
        service
            .submit(&stores.transactions, transaction("TXN-5"), &user("dana", Role::Employee))
            .await
            .expect("submit");

        let error = service
            .delete(&stores.transactions, "TXN-5", &user("dana", Role::Employee))
            .await
            .expect_err("employee cannot delete");
        assert!(matches!(error, ServiceError::Forbidden { .. }));

        service
            .delete(&stores.transactions, "TXN-5", &user("root", Role::Admin))
            .await
            .expect("admin delete");
        assert!(matches!(
            service
                .delete(&stores.transactions, "TXN-5", &user("root", Role::Admin))
                .await
                .expect_err("already gone"),
            ServiceError::NotFound { .. }
        ));
    }
}
