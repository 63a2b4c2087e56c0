use tracing::info;

use opsdesk_core::{Invoice, InvoiceStatus, Role, ServiceError, User, Validate};

use crate::repositories::{Repository, Stores};

use super::{ensure_role, storage};

/// Invoice lifecycle: draft, issue, settle (fully or partially), fall
/// overdue, cancel. Timestamps are stamped by the domain transition.
pub struct InvoiceService {
    stores: Stores,
}

impl InvoiceService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn load(&self, id: &str) -> Result<Invoice, ServiceError> {
        self.stores
            .invoices
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "invoice", id: id.to_owned() })
    }

    async fn transition(
        &self,
        id: &str,
        next: InvoiceStatus,
        actor: &User,
    ) -> Result<Invoice, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager],
            "change invoice status",
        )?;
        let mut invoice = self.load(id).await?;
        invoice.transition_to(next).map_err(ServiceError::from)?;
        self.stores.invoices.save(invoice.clone()).await.map_err(storage)?;
        info!(id, status = next.as_str(), actor = %actor.username, "invoice status changed");
        Ok(invoice)
    }

    pub async fn create(&self, invoice: Invoice, actor: &User) -> Result<Invoice, ServiceError> {
        ensure_role(actor, &[Role::Admin, Role::GeneralManager], "create invoices")?;
        invoice.validate()?;
        self.stores.invoices.save(invoice.clone()).await.map_err(storage)?;
        info!(id = %invoice.id.0, client = %invoice.client, "invoice drafted");
        Ok(invoice)
    }

    pub async fn issue(&self, id: &str, actor: &User) -> Result<Invoice, ServiceError> {
        self.transition(id, InvoiceStatus::Pending, actor).await
    }

    pub async fn mark_paid(&self, id: &str, actor: &User) -> Result<Invoice, ServiceError> {
        self.transition(id, InvoiceStatus::Paid, actor).await
    }

    pub async fn mark_partially_paid(
        &self,
        id: &str,
        actor: &User,
    ) -> Result<Invoice, ServiceError> {
        self.transition(id, InvoiceStatus::PartiallyPaid, actor).await
    }

    pub async fn mark_overdue(&self, id: &str, actor: &User) -> Result<Invoice, ServiceError> {
        self.transition(id, InvoiceStatus::Overdue, actor).await
    }

    pub async fn cancel(&self, id: &str, actor: &User) -> Result<Invoice, ServiceError> {
        self.transition(id, InvoiceStatus::Cancelled, actor).await
    }

    pub async fn delete(&self, id: &str, actor: &User) -> Result<(), ServiceError> {
        ensure_role(actor, &[Role::Admin, Role::GeneralManager], "delete invoices")?;
        let removed = self.stores.invoices.delete(id).await.map_err(storage)?;
        if !removed {
            return Err(ServiceError::NotFound { entity: "invoice", id: id.to_owned() });
        }
        Ok(())
    }

    pub async fn outstanding(&self) -> Vec<Invoice> {
        self.stores
            .invoices
            .list_where(|i| {
                matches!(
                    i.status,
                    InvoiceStatus::Pending | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue
                )
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use opsdesk_core::{Invoice, InvoiceId, InvoiceStatus, Role, ServiceError, User, UserId};

    use crate::repositories::Stores;

    use super::InvoiceService;

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

    fn invoice(id: &str) -> Invoice {
        Invoice {
            id: InvoiceId(id.to_owned()),
            client: "Acme Studios".to_owned(),
            project_id: None,
            amount: Decimal::new(12_000, 0),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 30).expect("date"),
            status: InvoiceStatus::Draft,
            paid_at: None,
            overdue_at: None,
            created_at: Utc::now(),
        }
    }

    fn service() -> (Stores, InvoiceService) {
        let stores = Stores::default();
        let service = InvoiceService::new(stores.clone());
        (stores, service)
    }

    #[tokio::test]
    async fn issue_then_pay_stamps_paid_at() {
        let (_, service) = service();
        let gm = user("grace", Role::GeneralManager);
        service.create(invoice("INV-1"), &gm).await.expect("create");

        service.issue("INV-1", &gm).await.expect("issue");
        assert_eq!(service.outstanding().await.len(), 1);

        let paid = service.mark_paid("INV-1", &gm).await.expect("pay");
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert!(service.outstanding().await.is_empty());
    }

    #[tokio::test]
    async fn overdue_invoices_can_still_settle() {
        let (_, service) = service();
        let gm = user("grace", Role::GeneralManager);
        service.create(invoice("INV-2"), &gm).await.expect("create");
        service.issue("INV-2", &gm).await.expect("issue");

        let overdue = service.mark_overdue("INV-2", &gm).await.expect("overdue");
        assert!(overdue.overdue_at.is_some());

        service.mark_partially_paid("INV-2", &gm).await.expect("partial settle");
        let paid = service.mark_paid("INV-2", &gm).await.expect("final settle");
        assert_eq!(paid.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn drafts_cannot_be_marked_paid() {
        let (_, service) = service();
        let gm = user("grace", Role::GeneralManager);
        service.create(invoice("INV-3"), &gm).await.expect("create");

        let error = service.mark_paid("INV-3", &gm).await.expect_err("draft cannot settle");
        assert!(matches!(error, ServiceError::Domain(_)));
    }

    #[tokio::test]
    async fn employees_cannot_touch_invoices() {
        let (_, service) = service();
        let error = service
            .create(invoice("INV-4"), &user("dana", Role::Employee))
            .await
            .expect_err("employee refused");
        assert!(matches!(error, ServiceError::Forbidden { .. }));
    }
}
