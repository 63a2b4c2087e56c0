use opsdesk_core::{Notification, ServiceError, UserId};

use crate::repositories::{Repository, Stores};

use super::storage;

pub struct NotificationService {
    stores: Stores,
}

impl NotificationService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn record(&self, notification: Notification) -> Result<(), ServiceError> {
        self.stores.notifications.save(notification).await.map_err(storage)
    }

    /// Newest first.
    pub async fn for_user(&self, recipient: &UserId) -> Vec<Notification> {
        let mut notifications =
            self.stores.notifications.list_where(|n| &n.recipient == recipient).await;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    pub async fn unread(&self, recipient: &UserId) -> Vec<Notification> {
        let mut unread = self
            .stores
            .notifications
            .list_where(|n| &n.recipient == recipient && !n.read)
            .await;
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        unread
    }

    pub async fn mark_read(&self, id: &str) -> Result<Notification, ServiceError> {
        let mut notification = self
            .stores
            .notifications
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| ServiceError::NotFound { entity: "notification", id: id.to_owned() })?;

        notification.mark_read();
        self.stores.notifications.save(notification.clone()).await.map_err(storage)?;
        Ok(notification)
    }

    pub async fn mark_all_read(&self, recipient: &UserId) -> Result<usize, ServiceError> {
        let unread = self.unread(recipient).await;
        let count = unread.len();
        for mut notification in unread {
            notification.mark_read();
            self.stores.notifications.save(notification).await.map_err(storage)?;
        }
        Ok(count)
    }
}
