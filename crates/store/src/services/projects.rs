use tracing::info;

use opsdesk_core::{
    FieldErrors, Project, ProjectStatus, Role, ServiceError, User, UserId, Validate,
};

use crate::repositories::{Repository, Stores};

use super::{ensure_role, storage};

pub struct ProjectService {
    stores: Stores,
}

impl ProjectService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn load(&self, id: &str) -> Result<Project, ServiceError> {
        self.stores
            .projects
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "project", id: id.to_owned() })
    }

    pub async fn create(&self, project: Project, actor: &User) -> Result<Project, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager, Role::ProjectCoordinator],
            "create projects",
        )?;
        project.validate()?;
        self.stores.projects.save(project.clone()).await.map_err(storage)?;
        info!(id = %project.id.0, name = %project.name, "project created");
        Ok(project)
    }

    pub async fn update_status(
        &self,
        id: &str,
        next: ProjectStatus,
        actor: &User,
    ) -> Result<Project, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager, Role::ProjectCoordinator],
            "change project status",
        )?;
        let mut project = self.load(id).await?;
        project.transition_to(next).map_err(ServiceError::from)?;
        self.stores.projects.save(project.clone()).await.map_err(storage)?;
        info!(id, status = next.as_str(), "project status changed");
        Ok(project)
    }

    /// Assigns a coordinator after checking the directory: the user must
    /// exist and actually hold the coordinator role.
    pub async fn assign_coordinator(
        &self,
        id: &str,
        coordinator: &UserId,
        actor: &User,
    ) -> Result<Project, ServiceError> {
        ensure_role(actor, &[Role::Admin, Role::GeneralManager], "assign project coordinators")?;

        let user = self
            .stores
            .users
            .find_by_id(&coordinator.0)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "user", id: coordinator.0.clone() })?;
        if user.role != Role::ProjectCoordinator {
            let mut errors = FieldErrors::new();
            errors.add("coordinator", "must hold the project coordinator role");
            return Err(errors.into());
        }

        let mut project = self.load(id).await?;
        project.coordinator = Some(coordinator.clone());
        self.stores.projects.save(project.clone()).await.map_err(storage)?;
        Ok(project)
    }

    pub async fn delete(&self, id: &str, actor: &User) -> Result<(), ServiceError> {
        ensure_role(actor, &[Role::Admin, Role::GeneralManager], "delete projects")?;
        let removed = self.stores.projects.delete(id).await.map_err(storage)?;
        if !removed {
            return Err(ServiceError::NotFound { entity: "project", id: id.to_owned() });
        }
        info!(id, actor = %actor.username, "project deleted");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Project>, ServiceError> {
        self.stores.projects.list().await.map_err(storage)
    }
}
