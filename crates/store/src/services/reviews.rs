use chrono::Utc;
use tracing::info;

use opsdesk_core::{
    AuditCategory, AuditEvent, AuditOutcome, AuditSink, FieldErrors, NotificationKind, Review,
    ReviewStatus, Role, ServiceError, User, Validate, WorkSubmission,
};

use crate::repositories::{Repository, Stores};

use super::{ensure_role, notify_role, notify_user, storage};

/// Work submission review loop: pending_review fans out to a verdict,
/// needs_revision loops back through resubmission.
pub struct ReviewService {
    stores: Stores,
}

impl ReviewService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn load(&self, id: &str) -> Result<WorkSubmission, ServiceError> {
        self.stores
            .submissions
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "work submission", id: id.to_owned() })
    }

    fn audit_verdict(&self, submission: &WorkSubmission, reviewer: &User, outcome: AuditOutcome) {
        self.stores.audit.emit(
            AuditEvent::new(
                Some(submission.id.0.clone()),
                "review.verdict_recorded",
                AuditCategory::Review,
                reviewer.username.clone(),
                outcome,
            )
            .with_metadata("status", submission.status.as_str()),
        );
    }

    pub async fn submit_work(
        &self,
        mut submission: WorkSubmission,
    ) -> Result<WorkSubmission, ServiceError> {
        submission.validate()?;
        submission.status = ReviewStatus::PendingReview;
        submission.review = None;
        self.stores.submissions.save(submission.clone()).await.map_err(storage)?;

        info!(id = %submission.id.0, task = %submission.task_id.0, "work submitted for review");
        notify_role(
            &self.stores,
            Role::ProjectCoordinator,
            NotificationKind::ApprovalRequested,
            &format!("Work submission `{}` awaits review", submission.id.0),
        )
        .await?;
        Ok(submission)
    }

    /// Records the coordinator's verdict. A rejection must carry a
    /// reason; approve and needs_revision carry feedback only.
    pub async fn review(
        &self,
        id: &str,
        reviewer: &User,
        verdict: ReviewStatus,
        feedback: impl Into<String>,
        rejection_reason: Option<String>,
    ) -> Result<WorkSubmission, ServiceError> {
        ensure_role(reviewer, &[Role::ProjectCoordinator], "review work submissions")?;

        if verdict == ReviewStatus::Rejected
            && rejection_reason.as_deref().map(str::trim).unwrap_or_default().is_empty()
        {
            let mut errors = FieldErrors::new();
            errors.add("rejection_reason", "is required when rejecting");
            return Err(errors.into());
        }

        let mut submission = self.load(id).await?;
        submission.transition_to(verdict).map_err(ServiceError::from)?;
        submission.review = Some(Review {
            reviewed_by: reviewer.id.clone(),
            reviewer_role: reviewer.role,
            review_date: Utc::now(),
            feedback: feedback.into(),
            rejection_reason,
        });
        self.stores.submissions.save(submission.clone()).await.map_err(storage)?;

        self.audit_verdict(
            &submission,
            reviewer,
            if verdict == ReviewStatus::Approved {
                AuditOutcome::Success
            } else {
                AuditOutcome::Rejected
            },
        );
        notify_user(
            &self.stores,
            submission.employee_id.clone(),
            NotificationKind::ReviewOutcome,
            format!("Your submission `{id}` was reviewed: {}", submission.status.as_str()),
        )
        .await?;
        Ok(submission)
    }

    /// Loops a needs_revision submission back into the review queue.
    pub async fn resubmit(
        &self,
        id: &str,
        actor: &User,
        summary: Option<String>,
    ) -> Result<WorkSubmission, ServiceError> {
        let mut submission = self.load(id).await?;
        if submission.employee_id != actor.id {
            return Err(ServiceError::Forbidden {
                action: "resubmit another employee's work".to_owned(),
                role: actor.role,
            });
        }

        if let Some(summary) = summary {
            submission.summary = summary;
        }
        submission.validate()?;
        submission.transition_to(ReviewStatus::PendingReview).map_err(ServiceError::from)?;
        submission.review = None;
        submission.submitted_at = Utc::now();
        self.stores.submissions.save(submission.clone()).await.map_err(storage)?;

        info!(id, employee = %actor.username, "work resubmitted after revision");
        notify_role(
            &self.stores,
            Role::ProjectCoordinator,
            NotificationKind::ApprovalRequested,
            &format!("Work submission `{id}` was revised and awaits re-review"),
        )
        .await?;
        Ok(submission)
    }

    pub async fn pending_queue(&self) -> Vec<WorkSubmission> {
        self.stores.submissions.list_where(|s| s.status == ReviewStatus::PendingReview).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use opsdesk_core::{
        NotificationKind, ReviewStatus, Role, ServiceError, TaskId, User, UserId, WorkSubmission,
        WorkSubmissionId,
    };

    use crate::repositories::{Repository, Stores};

    use super::ReviewService;

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

    fn submission(id: &str) -> WorkSubmission {
        WorkSubmission {
            id: WorkSubmissionId(id.to_owned()),
            task_id: TaskId("T-1".to_owned()),
            employee_id: UserId("u-dana".to_owned()),
            summary: "Homepage copy draft".to_owned(),
            attachment_url: None,
            status: ReviewStatus::PendingReview,
            review: None,
            submitted_at: Utc::now(),
        }
    }

    async fn seeded() -> (Stores, ReviewService) {
        let stores = Stores::default();
        for user in [user("dana", Role::Employee), user("cora", Role::ProjectCoordinator)] {
            stores.users.save(user).await.expect("seed user");
        }
        let service = ReviewService::new(stores.clone());
        (stores, service)
    }

    #[tokio::test]
    async fn approval_attaches_the_review_and_notifies_the_employee() {
        let (stores, service) = seeded().await;
        service.submit_work(submission("WS-1")).await.expect("submit");

        let reviewed = service
            .review(
                "WS-1",
                &user("cora", Role::ProjectCoordinator),
                ReviewStatus::Approved,
                "Clean work",
                None,
            )
            .await
            .expect("approve");

        assert_eq!(reviewed.status, ReviewStatus::Approved);
        let review = reviewed.review.expect("review attached");
        assert_eq!(review.reviewed_by, UserId("u-cora".to_owned()));
        assert_eq!(review.feedback, "Clean work");

        let outcomes = stores
            .notifications
            .list_where(|n| n.kind == NotificationKind::ReviewOutcome)
            .await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].message.contains("approved"));
    }

    #[tokio::test]
    async fn rejection_without_a_reason_is_refused() {
        let (_, service) = seeded().await;
        service.submit_work(submission("WS-2")).await.expect("submit");

        let error = service
            .review(
                "WS-2",
                &user("cora", Role::ProjectCoordinator),
                ReviewStatus::Rejected,
                "",
                Some("  ".to_owned()),
            )
            .await
            .expect_err("blank reason");
        match error {
            ServiceError::Validation(errors) => {
                assert_eq!(errors.field("rejection_reason"), ["is required when rejecting"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn employees_cannot_review() {
        let (_, service) = seeded().await;
        service.submit_work(submission("WS-3")).await.expect("submit");

        let error = service
            .review("WS-3", &user("dana", Role::Employee), ReviewStatus::Approved, "self", None)
            .await
            .expect_err("employee reviewing");
        assert!(matches!(error, ServiceError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn revision_loop_returns_to_the_queue() {
        let (_, service) = seeded().await;
        service.submit_work(submission("WS-4")).await.expect("submit");
        service
            .review(
                "WS-4",
                &user("cora", Role::ProjectCoordinator),
                ReviewStatus::NeedsRevision,
                "Tighten the intro",
                None,
            )
            .await
            .expect("needs revision");

        let error = service
            .resubmit("WS-4", &user("cora", Role::ProjectCoordinator), None)
            .await
            .expect_err("only the author resubmits");
        assert!(matches!(error, ServiceError::Forbidden { .. }));

        let resubmitted = service
            .resubmit("WS-4", &user("dana", Role::Employee), Some("Revised draft".to_owned()))
            .await
            .expect("resubmit");
        assert_eq!(resubmitted.status, ReviewStatus::PendingReview);
        assert_eq!(resubmitted.summary, "Revised draft");
        assert!(resubmitted.review.is_none());

        assert_eq!(service.pending_queue().await.len(), 1);
    }
}
