use super::{MemoryStore, newest_first};
use crate::application_port::NotificationError;
use crate::domain_model::*;
use crate::domain_port::NotificationRepo;

#[async_trait::async_trait]
impl NotificationRepo for MemoryStore {
    async fn insert(&self, notification: &NotificationRecord) -> Result<(), NotificationError> {
        self.lock()
            .notifications
            .insert(notification.notification_id, notification.clone());
        Ok(())
    }

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<NotificationRecord>, NotificationError> {
        Ok(self.lock().notifications.get(&notification_id).cloned())
    }

    async fn list_recent(
        &self,
        recipient: UserId,
        limit: u32,
    ) -> Result<Vec<NotificationRecord>, NotificationError> {
        let found = self
            .lock()
            .notifications
            .values()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect();
        let mut found = newest_first(found, |n| n.created_at);
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn mark_read(&self, notification_id: NotificationId) -> Result<(), NotificationError> {
        let mut state = self.lock();
        let notification = state
            .notifications
            .get_mut(&notification_id)
            .ok_or(NotificationError::NotFound)?;
        notification.read = true;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, NotificationError> {
        let mut changed = 0;
        for n in self
            .lock()
            .notifications
            .values_mut()
            .filter(|n| n.recipient == recipient && !n.read)
        {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, notification_id: NotificationId) -> Result<(), NotificationError> {
        self.lock()
            .notifications
            .remove(&notification_id)
            .map(|_| ())
            .ok_or(NotificationError::NotFound)
    }

    async fn count_unread(&self, recipient: UserId) -> Result<u64, NotificationError> {
        Ok(self
            .lock()
            .notifications
            .values()
            .filter(|n| n.recipient == recipient && !n.read)
            .count() as u64)
    }
}
