use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{Repository, RepositoryError, StoreRecord};

/// Keyed map behind an async lock. The whole system is backed by these;
/// nothing survives process exit except the session file.
pub struct InMemoryRepository<T> {
    records: RwLock<HashMap<String, T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self { records: RwLock::new(HashMap::new()) }
    }
}

impl<T: StoreRecord> InMemoryRepository<T> {
    /// Snapshot of every record matching the predicate.
    pub async fn list_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let records = self.records.read().await;
        records.values().filter(|record| predicate(record)).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl<T: StoreRecord> Repository<T> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn save(&self, record: T) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert(record.record_id().to_owned(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        Ok(records.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<T>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use opsdesk_core::{Project, ProjectId, ProjectStatus};

    use crate::repositories::{InMemoryRepository, Repository};

    fn project(id: &str) -> Project {
        Project {
            id: ProjectId(id.to_owned()),
            name: format!("Project {id}"),
            client: "Acme Studios".to_owned(),
            description: None,
            coordinator: None,
            start_date: None,
            deadline: None,
            status: ProjectStatus::Planning,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_find_delete_round_trip() {
        let repo = InMemoryRepository::default();
        let record = project("P-1");

        repo.save(record.clone()).await.expect("save");
        let found = repo.find_by_id("P-1").await.expect("find");
        assert_eq!(found, Some(record));

        assert!(repo.delete("P-1").await.expect("delete"));
        assert!(!repo.delete("P-1").await.expect("second delete is a no-op"));
        assert_eq!(repo.find_by_id("P-1").await.expect("find after delete"), None);
    }

    #[tokio::test]
    async fn save_overwrites_by_id() {
        let repo = InMemoryRepository::default();
        repo.save(project("P-1")).await.expect("save");

        let mut updated = project("P-1");
        updated.status = ProjectStatus::InProgress;
        repo.save(updated).await.expect("overwrite");

        assert_eq!(repo.len().await, 1);
        let found = repo.find_by_id("P-1").await.expect("find").expect("present");
        assert_eq!(found.status, ProjectStatus::InProgress);
    }

    #[tokio::test]
    async fn list_where_filters_on_the_snapshot() {
        let repo = InMemoryRepository::default();
        repo.save(project("P-1")).await.expect("save");
        let mut active = project("P-2");
        active.status = ProjectStatus::InProgress;
        repo.save(active).await.expect("save");

        let matches = repo.list_where(|p| p.status == ProjectStatus::InProgress).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, opsdesk_core::ProjectId("P-2".to_owned()));
    }
}
