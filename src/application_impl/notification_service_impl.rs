use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;

pub struct RealNotificationService {
    notification_repo: Arc<dyn NotificationRepo>,
    room_broker: Arc<dyn RoomBroker>,
}

impl RealNotificationService {
    pub fn new(
        notification_repo: Arc<dyn NotificationRepo>,
        room_broker: Arc<dyn RoomBroker>,
    ) -> RealNotificationService {
        RealNotificationService {
            notification_repo,
            room_broker,
        }
    }

    async fn owned(
        &self,
        notification_id: NotificationId,
        acting: UserId,
    ) -> Result<NotificationRecord, NotificationError> {
        let record = self
            .notification_repo
            .get(notification_id)
            .await?
            .ok_or(NotificationError::NotFound)?;
        if record.recipient != acting {
            return Err(NotificationError::Unauthorized);
        }
        Ok(record)
    }
}

#[async_trait::async_trait]
impl NotificationService for RealNotificationService {
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<Option<NotificationRecord>, NotificationError> {
        if draft.sender == Some(draft.recipient) {
            return Ok(None);
        }

        let record = NotificationRecord::from_draft(draft, Utc::now());
        self.notification_repo.insert(&record).await?;
        tracing::debug!(
            recipient = %record.recipient,
            kind = record.kind.type_name(),
            "notification stored"
        );

        emit_to_user(
            self.room_broker.as_ref(),
            record.recipient,
            &S2CEvent::NewNotification(record.clone()),
        )
        .await;

        Ok(Some(record))
    }

    async fn list(&self, recipient: UserId) -> Result<Vec<NotificationRecord>, NotificationError> {
        self.notification_repo
            .list_recent(recipient, NOTIFICATION_LIST_LIMIT)
            .await
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
        acting: UserId,
    ) -> Result<(), NotificationError> {
        let record = self.owned(notification_id, acting).await?;
        if record.read {
            return Ok(());
        }
        self.notification_repo.mark_read(notification_id).await
    }

    async fn mark_all_read(&self, acting: UserId) -> Result<u64, NotificationError> {
        self.notification_repo.mark_all_read(acting).await
    }

    async fn delete(
        &self,
        notification_id: NotificationId,
        acting: UserId,
    ) -> Result<(), NotificationError> {
        self.owned(notification_id, acting).await?;
        self.notification_repo.delete(notification_id).await
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64, NotificationError> {
        self.notification_repo.count_unread(recipient).await
    }
}
