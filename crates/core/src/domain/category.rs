use serde::{Deserialize, Serialize};

use crate::validation::{require_text, FieldErrors, Validate};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

/// Settings-managed lookup lists the forms populate dropdowns from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    ExpenseCategory,
    LeaveType,
    Department,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub active: bool,
}

impl Category {
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), FieldErrors> {
        let name = name.into();
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &name);
        errors.into_result()?;
        self.name = name;
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

impl Validate for Category {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, CategoryId, CategoryKind};

    fn category() -> Category {
        Category {
            id: CategoryId("cat-travel".to_owned()),
            name: "Travel".to_owned(),
            kind: CategoryKind::ExpenseCategory,
            active: true,
        }
    }

    #[test]
    fn rename_refuses_blank_names() {
        let mut category = category();
        let errors = category.rename("  ").expect_err("blank name");
        assert_eq!(errors.field("name"), ["is required"]);
        assert_eq!(category.name, "Travel");

        category.rename("Travel & Transport").expect("rename");
        assert_eq!(category.name, "Travel & Transport");
    }

    #[test]
    fn deactivation_keeps_the_record() {
        let mut category = category();
        category.deactivate();
        assert!(!category.active);
    }
}
