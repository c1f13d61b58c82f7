use crate::domain_model::*;

pub const NOTIFICATION_LIST_LIMIT: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification not found")]
    NotFound,
    #[error("notification belongs to another user")]
    Unauthorized,
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Persist and push. Returns `None` for self-notifications, which are
    /// dropped.
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<Option<NotificationRecord>, NotificationError>;

    /// Best-effort variant used by other components: failures are logged
    /// and never reach the caller.
    async fn notify(&self, draft: NotificationDraft) {
        let recipient = draft.recipient;
        let kind = draft.kind.type_name();
        if let Err(e) = self.create_notification(draft).await {
            tracing::warn!(%recipient, kind, "notification dropped: {e}");
        }
    }

    /// Newest first, capped at [`NOTIFICATION_LIST_LIMIT`].
    async fn list(&self, recipient: UserId) -> Result<Vec<NotificationRecord>, NotificationError>;

    async fn mark_read(
        &self,
        notification_id: NotificationId,
        acting: UserId,
    ) -> Result<(), NotificationError>;

    async fn mark_all_read(&self, acting: UserId) -> Result<u64, NotificationError>;

    async fn delete(
        &self,
        notification_id: NotificationId,
        acting: UserId,
    ) -> Result<(), NotificationError>;

    async fn unread_count(&self, recipient: UserId) -> Result<u64, NotificationError>;
}
