use super::util::push_in_list;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySql, MySqlPool, QueryBuilder};

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: UserId,
    display_name: String,
    avatar_uri: Option<String>,
}

impl From<UserRow> for UserSummary {
    fn from(r: UserRow) -> Self {
        UserSummary {
            user_id: r.user_id,
            display_name: r.display_name,
            avatar_uri: r.avatar_uri,
        }
    }
}

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn get_summary(&self, user_id: UserId) -> Result<Option<UserSummary>, UserError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, display_name, avatar_uri FROM user_profile WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::Store(format!("query user: {e}")))?;

        Ok(row.map(UserSummary::from))
    }

    async fn get_summaries(&self, user_ids: &[UserId]) -> Result<Vec<UserSummary>, UserError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT user_id, display_name, avatar_uri FROM user_profile WHERE user_id IN ",
        );
        push_in_list(&mut qb, user_ids);

        let rows: Vec<UserRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::Store(format!("query users: {e}")))?;

        Ok(rows.into_iter().map(UserSummary::from).collect())
    }

    async fn is_blocked_either(&self, a: UserId, b: UserId) -> Result<bool, UserError> {
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(1)
FROM user_block
WHERE (blocker_id = ? AND blocked_id = ?)
   OR (blocker_id = ? AND blocked_id = ?)
"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| UserError::Store(format!("query block: {e}")))?;

        Ok(count > 0)
    }

    async fn block(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError> {
        sqlx::query("INSERT IGNORE INTO user_block (blocker_id, blocked_id) VALUES (?, ?)")
            .bind(blocker)
            .bind(blocked)
            .execute(&self.pool)
            .await
            .map_err(|e| UserError::Store(format!("insert block: {e}")))?;
        Ok(())
    }

    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError> {
        sqlx::query("DELETE FROM user_block WHERE blocker_id = ? AND blocked_id = ?")
            .bind(blocker)
            .bind(blocked)
            .execute(&self.pool)
            .await
            .map_err(|e| UserError::Store(format!("delete block: {e}")))?;
        Ok(())
    }

    async fn list_blocked(&self, blocker: UserId) -> Result<Vec<UserId>, UserError> {
        sqlx::query_scalar(
            "SELECT blocked_id FROM user_block WHERE blocker_id = ? ORDER BY created_at DESC",
        )
        .bind(blocker)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserError::Store(format!("list blocks: {e}")))
    }
}
