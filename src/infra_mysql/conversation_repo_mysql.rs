use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

#[derive(sqlx::FromRow)]
struct ConversationRow {
    conversation_id: ConversationId,
    user_min: UserId,
    user_max: UserId,
    last_message_id: Option<MessageId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for ConversationRecord {
    fn from(r: ConversationRow) -> Self {
        ConversationRecord {
            conversation_id: r.conversation_id,
            participants: UserPair::new(r.user_min, r.user_max),
            last_message: r.last_message_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT_CONVERSATION: &str = r#"
SELECT conversation_id, user_min, user_max, last_message_id, created_at, updated_at
FROM conversation
"#;

pub struct MySqlConversationRepo {
    pool: MySqlPool,
}

impl MySqlConversationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlConversationRepo { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MySqlConversationRepo {
    async fn claim(&self, conversation: &ConversationRecord) -> Result<Claim, ChatError> {
        let res = sqlx::query(
            r#"
INSERT INTO conversation (conversation_id, user_min, user_max, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(conversation.conversation_id)
        .bind(conversation.participants.min())
        .bind(conversation.participants.max())
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(Claim::Won),
            Err(e) if is_dup_key(&e) => Ok(Claim::Existing),
            Err(e) => Err(ChatError::Store(format!("insert conversation: {e}"))),
        }
    }

    async fn find_by_pair(&self, pair: UserPair) -> Result<Option<ConversationRecord>, ChatError> {
        let sql = format!("{SELECT_CONVERSATION} WHERE user_min = ? AND user_max = ?");
        let row: Option<ConversationRow> = sqlx::query_as(&sql)
            .bind(pair.min())
            .bind(pair.max())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("query conversation: {e}")))?;

        Ok(row.map(ConversationRecord::from))
    }

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<ConversationRecord>, ChatError> {
        let sql = format!("{SELECT_CONVERSATION} WHERE conversation_id = ?");
        let row: Option<ConversationRow> = sqlx::query_as(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("query conversation: {e}")))?;

        Ok(row.map(ConversationRecord::from))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConversationRecord>, ChatError> {
        let sql = format!(
            "{SELECT_CONVERSATION} WHERE user_min = ? OR user_max = ? ORDER BY updated_at DESC"
        );
        let rows: Vec<ConversationRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("list conversations: {e}")))?;

        Ok(rows.into_iter().map(ConversationRecord::from).collect())
    }

    async fn delete(&self, conversation_id: ConversationId) -> Result<(), ChatError> {
        // messages and read receipts cascade
        let res = sqlx::query("DELETE FROM conversation WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ChatError::Store(format!("delete conversation: {e}")))?;

        if res.rows_affected() == 0 {
            return Err(ChatError::ConversationNotFound);
        }
        Ok(())
    }
}
