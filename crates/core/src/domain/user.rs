use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Agency roles, ordered by approval authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    ProjectCoordinator,
    HrManager,
    GeneralManager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::ProjectCoordinator => "project_coordinator",
            Self::HrManager => "hr_manager",
            Self::GeneralManager => "general_manager",
            Self::Admin => "admin",
        }
    }

    /// Roles allowed to hard-delete records. Everyone else only ever
    /// moves statuses.
    pub fn can_delete_records(&self) -> bool {
        matches!(self, Self::Admin | Self::GeneralManager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn only_admin_and_gm_may_delete() {
        assert!(Role::Admin.can_delete_records());
        assert!(Role::GeneralManager.can_delete_records());
        assert!(!Role::HrManager.can_delete_records());
        assert!(!Role::ProjectCoordinator.can_delete_records());
        assert!(!Role::Employee.can_delete_records());
    }

    #[test]
    fn role_tags_are_snake_case() {
        let tag = serde_json::to_string(&Role::ProjectCoordinator).expect("serialize role");
        assert_eq!(tag, "\"project_coordinator\"");
    }
}
