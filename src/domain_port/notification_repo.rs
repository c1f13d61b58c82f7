use crate::application_port::NotificationError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert(&self, notification: &NotificationRecord) -> Result<(), NotificationError>;

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<NotificationRecord>, NotificationError>;

    /// Newest first, at most `limit` rows.
    async fn list_recent(
        &self,
        recipient: UserId,
        limit: u32,
    ) -> Result<Vec<NotificationRecord>, NotificationError>;

    async fn mark_read(&self, notification_id: NotificationId) -> Result<(), NotificationError>;

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, NotificationError>;

    async fn delete(&self, notification_id: NotificationId) -> Result<(), NotificationError>;

    async fn count_unread(&self, recipient: UserId) -> Result<u64, NotificationError>;
}
