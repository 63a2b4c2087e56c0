use tracing::info;

use opsdesk_core::{NotificationKind, Role, ServiceError, Task, TaskStatus, User, UserId, Validate};

use crate::repositories::{Repository, Stores};

use super::{ensure_role, notify_user, storage};

pub struct TaskService {
    stores: Stores,
}

impl TaskService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn load(&self, id: &str) -> Result<Task, ServiceError> {
        self.stores
            .tasks
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "task", id: id.to_owned() })
    }

    /// Creates a task under an existing project.
    pub async fn create(&self, task: Task, actor: &User) -> Result<Task, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager, Role::ProjectCoordinator],
            "create tasks",
        )?;
        task.validate()?;

        let project_exists = self
            .stores
            .projects
            .find_by_id(&task.project_id.0)
            .await
            .map_err(storage)?
            .is_some();
        if !project_exists {
            return Err(ServiceError::NotFound {
                entity: "project",
                id: task.project_id.0.clone(),
            });
        }

        self.stores.tasks.save(task.clone()).await.map_err(storage)?;
        info!(id = %task.id.0, project = %task.project_id.0, "task created");

        if let Some(assignee) = &task.assignee {
            notify_user(
                &self.stores,
                assignee.clone(),
                NotificationKind::System,
                format!("You were assigned task `{}`: {}", task.id.0, task.title),
            )
            .await?;
        }
        Ok(task)
    }

    pub async fn assign(
        &self,
        id: &str,
        assignee: &UserId,
        actor: &User,
    ) -> Result<Task, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager, Role::ProjectCoordinator],
            "assign tasks",
        )?;

        let exists =
            self.stores.users.find_by_id(&assignee.0).await.map_err(storage)?.is_some();
        if !exists {
            return Err(ServiceError::NotFound { entity: "user", id: assignee.0.clone() });
        }

        let mut task = self.load(id).await?;
        task.assignee = Some(assignee.clone());
        self.stores.tasks.save(task.clone()).await.map_err(storage)?;

        notify_user(
            &self.stores,
            assignee.clone(),
            NotificationKind::System,
            format!("You were assigned task `{id}`: {}", task.title),
        )
        .await?;
        Ok(task)
    }

    /// Status move through the task table; completion stamps the
    /// timestamp inside `transition_to`.
    pub async fn update_status(
        &self,
        id: &str,
        next: TaskStatus,
        actor: &User,
    ) -> Result<Task, ServiceError> {
        let mut task = self.load(id).await?;

        // Assignees may move their own task; anyone else needs a
        // coordinating role.
        let is_assignee = task.assignee.as_ref() == Some(&actor.id);
        if !is_assignee {
            ensure_role(
                actor,
                &[Role::Admin, Role::GeneralManager, Role::ProjectCoordinator],
                "change another employee's task status",
            )?;
        }

        task.transition_to(next).map_err(ServiceError::from)?;
        self.stores.tasks.save(task.clone()).await.map_err(storage)?;
        info!(id, status = next.as_str(), actor = %actor.username, "task status changed");
        Ok(task)
    }

    pub async fn delete(&self, id: &str, actor: &User) -> Result<(), ServiceError> {
        ensure_role(actor, &[Role::Admin, Role::GeneralManager], "delete tasks")?;
        let removed = self.stores.tasks.delete(id).await.map_err(storage)?;
        if !removed {
            return Err(ServiceError::NotFound { entity: "task", id: id.to_owned() });
        }
        Ok(())
    }

    pub async fn for_project(&self, project_id: &str) -> Vec<Task> {
        self.stores.tasks.list_where(|t| t.project_id.0 == project_id).await
    }

    pub async fn for_assignee(&self, assignee: &UserId) -> Vec<Task> {
        self.stores.tasks.list_where(|t| t.assignee.as_ref() == Some(assignee)).await
    }
}
