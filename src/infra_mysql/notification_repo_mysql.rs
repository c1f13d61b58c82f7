use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use sqlx::types::Json;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    notification_id: NotificationId,
    recipient_id: UserId,
    sender_id: Option<UserId>,
    kind: Json<NotificationKind>,
    title: String,
    message: String,
    link: Option<String>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(r: NotificationRow) -> Self {
        NotificationRecord {
            notification_id: r.notification_id,
            recipient: r.recipient_id,
            sender: r.sender_id,
            kind: r.kind.0,
            title: r.title,
            message: r.message,
            link: r.link,
            read: r.is_read,
            created_at: r.created_at,
        }
    }
}

const SELECT_NOTIFICATION: &str = r#"
SELECT notification_id, recipient_id, sender_id, kind, title, message, link, is_read, created_at
FROM notification
"#;

pub struct MySqlNotificationRepo {
    pool: MySqlPool,
}

impl MySqlNotificationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlNotificationRepo { pool }
    }
}

#[async_trait::async_trait]
impl NotificationRepo for MySqlNotificationRepo {
    async fn insert(&self, notification: &NotificationRecord) -> Result<(), NotificationError> {
        sqlx::query(
            r#"
INSERT INTO notification
    (notification_id, recipient_id, sender_id, notification_type, kind,
     title, message, link, is_read, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(notification.notification_id)
        .bind(notification.recipient)
        .bind(notification.sender)
        .bind(notification.kind.type_name())
        .bind(Json(&notification.kind))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.link.as_deref())
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("insert notification: {e}")))?;
        Ok(())
    }

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<NotificationRecord>, NotificationError> {
        let sql = format!("{SELECT_NOTIFICATION} WHERE notification_id = ?");
        let row: Option<NotificationRow> = sqlx::query_as(&sql)
            .bind(notification_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("query notification: {e}")))?;

        Ok(row.map(NotificationRecord::from))
    }

    async fn list_recent(
        &self,
        recipient: UserId,
        limit: u32,
    ) -> Result<Vec<NotificationRecord>, NotificationError> {
        let sql = format!("{SELECT_NOTIFICATION} WHERE recipient_id = ? ORDER BY created_at DESC LIMIT ?");
        let rows: Vec<NotificationRow> = sqlx::query_as(&sql)
            .bind(recipient)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("list notifications: {e}")))?;

        Ok(rows.into_iter().map(NotificationRecord::from).collect())
    }

    async fn mark_read(&self, notification_id: NotificationId) -> Result<(), NotificationError> {
        sqlx::query("UPDATE notification SET is_read = TRUE WHERE notification_id = ?")
            .bind(notification_id)
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("mark read: {e}")))?;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, NotificationError> {
        let res = sqlx::query("UPDATE notification SET is_read = TRUE WHERE recipient_id = ? AND is_read = FALSE")
            .bind(recipient)
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("mark all read: {e}")))?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, notification_id: NotificationId) -> Result<(), NotificationError> {
        let res = sqlx::query("DELETE FROM notification WHERE notification_id = ?")
            .bind(notification_id)
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("delete notification: {e}")))?;
        if res.rows_affected() == 0 {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    async fn count_unread(&self, recipient: UserId) -> Result<u64, NotificationError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM notification WHERE recipient_id = ? AND is_read = FALSE",
        )
        .bind(recipient)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("count unread: {e}")))?;
        Ok(count.max(0) as u64)
    }
}
