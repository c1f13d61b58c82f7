use super::util::push_in_list;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
struct MessageRow {
    message_id: MessageId,
    conversation_id: ConversationId,
    sender_id: UserId,
    content: String,
    status: DeliveryState,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ReadRow {
    message_id: MessageId,
    user_id: UserId,
}

pub struct MySqlMessageRepo {
    pool: MySqlPool,
}

impl MySqlMessageRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlMessageRepo { pool }
    }

    /// Join read receipts onto message rows, preserving row order.
    async fn with_receipts(&self, rows: Vec<MessageRow>) -> Result<Vec<MessageRecord>, ChatError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<MessageId> = rows.iter().map(|r| r.message_id).collect();
        let mut qb: QueryBuilder<MySql> =
            QueryBuilder::new("SELECT message_id, user_id FROM message_read WHERE message_id IN ");
        push_in_list(&mut qb, &ids);
        qb.push(" ORDER BY read_at ASC");

        let receipts: Vec<ReadRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("query receipts: {e}")))?;

        let mut read_by: HashMap<MessageId, Vec<UserId>> = HashMap::new();
        for r in receipts {
            read_by.entry(r.message_id).or_default().push(r.user_id);
        }

        Ok(rows
            .into_iter()
            .map(|r| MessageRecord {
                read_by: read_by.remove(&r.message_id).unwrap_or_default(),
                message_id: r.message_id,
                conversation_id: r.conversation_id,
                sender: r.sender_id,
                text: r.content,
                status: r.status,
                created_at: r.created_at,
            })
            .collect())
    }
}

const UNREAD_FOR_USER: &str = r#"
FROM message m
JOIN conversation c ON c.conversation_id = m.conversation_id
WHERE (c.user_min = ? OR c.user_max = ?)
  AND m.sender_id <> ?
  AND NOT EXISTS (
      SELECT 1 FROM message_read r WHERE r.message_id = m.message_id AND r.user_id = ?
  )
"#;

#[async_trait::async_trait]
impl MessageRepo for MySqlMessageRepo {
    async fn insert(&self, message: &MessageRecord) -> Result<(), ChatError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ChatError::Store(format!("begin: {e}")))?;

        sqlx::query(
            r#"
INSERT INTO message (message_id, conversation_id, sender_id, content, status, created_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(message.message_id)
        .bind(message.conversation_id)
        .bind(message.sender)
        .bind(&message.text)
        .bind(message.status)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| ChatError::Store(format!("insert message: {e}")))?;

        for reader in &message.read_by {
            sqlx::query("INSERT IGNORE INTO message_read (message_id, user_id, read_at) VALUES (?, ?, ?)")
                .bind(message.message_id)
                .bind(*reader)
                .bind(message.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| ChatError::Store(format!("insert receipt: {e}")))?;
        }

        let res = sqlx::query(
            "UPDATE conversation SET last_message_id = ?, updated_at = ? WHERE conversation_id = ?",
        )
        .bind(message.message_id)
        .bind(message.created_at)
        .bind(message.conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ChatError::Store(format!("advance conversation: {e}")))?;
        if res.rows_affected() == 0 {
            return Err(ChatError::ConversationNotFound);
        }

        tx.commit()
            .await
            .map_err(|e| ChatError::Store(format!("commit: {e}")))?;
        Ok(())
    }

    async fn get_many(&self, message_ids: &[MessageId]) -> Result<Vec<MessageRecord>, ChatError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT message_id, conversation_id, sender_id, content, status, created_at \
             FROM message WHERE message_id IN ",
        );
        push_in_list(&mut qb, message_ids);

        let rows: Vec<MessageRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("query messages: {e}")))?;

        self.with_receipts(rows).await
    }

    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
SELECT message_id, conversation_id, sender_id, content, status, created_at
FROM message
WHERE conversation_id = ?
ORDER BY created_at ASC, message_id ASC
"#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::Store(format!("list messages: {e}")))?;

        self.with_receipts(rows).await
    }

    async fn mark_read(&self, conversation_id: ConversationId, reader: UserId) -> Result<u64, ChatError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ChatError::Store(format!("begin: {e}")))?;

        let res = sqlx::query(
            r#"
INSERT IGNORE INTO message_read (message_id, user_id, read_at)
SELECT m.message_id, ?, ?
FROM message m
WHERE m.conversation_id = ? AND m.sender_id <> ?
"#,
        )
        .bind(reader)
        .bind(Utc::now())
        .bind(conversation_id)
        .bind(reader)
        .execute(&mut *tx)
        .await
        .map_err(|e| ChatError::Store(format!("insert receipts: {e}")))?;

        sqlx::query(
            "UPDATE message SET status = 'read' WHERE conversation_id = ? AND sender_id <> ? AND status = 'sent'",
        )
        .bind(conversation_id)
        .bind(reader)
        .execute(&mut *tx)
        .await
        .map_err(|e| ChatError::Store(format!("update status: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| ChatError::Store(format!("commit: {e}")))?;

        Ok(res.rows_affected())
    }

    async fn count_unread_total(&self, user_id: UserId) -> Result<u64, ChatError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) {UNREAD_FOR_USER}"))
            .bind(user_id)
            .bind(user_id)
            .bind(user_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("count unread: {e}")))?;

        Ok(count.max(0) as u64)
    }

    async fn count_unread_by_conversation(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<ConversationId, u64>, ChatError> {
        let rows: Vec<(ConversationId, i64)> = sqlx::query_as(&format!(
            "SELECT m.conversation_id, COUNT(1) {UNREAD_FOR_USER} GROUP BY m.conversation_id"
        ))
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::Store(format!("count unread: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, n.max(0) as u64))
            .collect())
    }
}
