use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

#[derive(sqlx::FromRow)]
struct ContactRequestRow {
    request_id: ContactRequestId,
    requester_id: UserId,
    recipient_id: UserId,
    post_id: PostId,
    message: Option<String>,
    status: ContactStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContactRequestRow> for ContactRequest {
    fn from(r: ContactRequestRow) -> Self {
        ContactRequest {
            request_id: r.request_id,
            requester: r.requester_id,
            recipient: r.recipient_id,
            post_id: r.post_id,
            message: r.message,
            status: r.status,
            created_at: r.created_at,
            expires_at: r.expires_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT_REQUEST: &str = r#"
SELECT request_id, requester_id, recipient_id, post_id, message, status,
       created_at, expires_at, updated_at
FROM contact_request
"#;

pub struct MySqlContactRequestRepo {
    pool: MySqlPool,
}

impl MySqlContactRequestRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlContactRequestRepo { pool }
    }

    async fn fetch_where(
        &self,
        clause: &str,
        user_id: UserId,
    ) -> Result<Vec<ContactRequest>, ContactError> {
        let sql = format!("{SELECT_REQUEST} WHERE {clause} = ? ORDER BY created_at DESC");
        let rows: Vec<ContactRequestRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("list requests: {e}")))?;

        Ok(rows.into_iter().map(ContactRequest::from).collect())
    }
}

#[async_trait::async_trait]
impl ContactRequestRepo for MySqlContactRequestRepo {
    async fn claim(&self, request: &ContactRequest) -> Result<Claim, ContactError> {
        let res = sqlx::query(
            r#"
INSERT INTO contact_request
    (request_id, requester_id, recipient_id, post_id, message, status,
     created_at, expires_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(request.request_id)
        .bind(request.requester)
        .bind(request.recipient)
        .bind(request.post_id)
        .bind(request.message.as_deref())
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.expires_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(Claim::Won),
            Err(e) if is_dup_key(&e) => Ok(Claim::Existing),
            Err(e) => Err(ContactError::Store(format!("insert request: {e}"))),
        }
    }

    async fn get(&self, request_id: ContactRequestId) -> Result<Option<ContactRequest>, ContactError> {
        let sql = format!("{SELECT_REQUEST} WHERE request_id = ?");
        let row: Option<ContactRequestRow> = sqlx::query_as(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("query request: {e}")))?;

        Ok(row.map(ContactRequest::from))
    }

    async fn find_by_post_and_requester(
        &self,
        post_id: PostId,
        requester: UserId,
    ) -> Result<Option<ContactRequest>, ContactError> {
        let sql = format!("{SELECT_REQUEST} WHERE post_id = ? AND requester_id = ?");
        let row: Option<ContactRequestRow> = sqlx::query_as(&sql)
            .bind(post_id)
            .bind(requester)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("query request: {e}")))?;

        Ok(row.map(ContactRequest::from))
    }

    async fn settle_pending(
        &self,
        request_id: ContactRequestId,
        status: ContactStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ContactError> {
        let res = sqlx::query(
            r#"
UPDATE contact_request SET status = ?, updated_at = ?
WHERE request_id = ? AND status = 'pending' AND expires_at > ?
"#,
        )
        .bind(status)
        .bind(at)
        .bind(request_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| ContactError::Store(format!("update request: {e}")))?;

        if res.rows_affected() > 0 {
            return Ok(true);
        }
        match self.get(request_id).await? {
            Some(_) => Ok(false),
            None => Err(ContactError::NotFound),
        }
    }

    async fn delete(&self, request_id: ContactRequestId) -> Result<bool, ContactError> {
        let res = sqlx::query("DELETE FROM contact_request WHERE request_id = ?")
            .bind(request_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("delete request: {e}")))?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_by_recipient(&self, recipient: UserId) -> Result<Vec<ContactRequest>, ContactError> {
        self.fetch_where("recipient_id", recipient).await
    }

    async fn list_by_requester(&self, requester: UserId) -> Result<Vec<ContactRequest>, ContactError> {
        self.fetch_where("requester_id", requester).await
    }

    async fn approved_between(&self, a: UserId, b: UserId) -> Result<bool, ContactError> {
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(1)
FROM contact_request
WHERE status = 'approved'
  AND ((requester_id = ? AND recipient_id = ?) OR (requester_id = ? AND recipient_id = ?))
"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ContactError::Store(format!("query approval: {e}")))?;

        Ok(count > 0)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<ContactRequest>, ContactError> {
        let sql = format!("{SELECT_REQUEST} WHERE status = 'pending' AND expires_at <= ?");
        let due: Vec<ContactRequestRow> = sqlx::query_as(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("query due requests: {e}")))?;

        let mut expired = Vec::with_capacity(due.len());
        for row in due {
            // guarded on status so a concurrent decision or another sweeper wins cleanly
            let res = sqlx::query(
                r#"
UPDATE contact_request SET status = 'expired', updated_at = ?
WHERE request_id = ? AND status = 'pending'
"#,
            )
            .bind(now)
            .bind(row.request_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("expire request: {e}")))?;

            if res.rows_affected() == 1 {
                let mut request = ContactRequest::from(row);
                request.status = ContactStatus::Expired;
                request.updated_at = now;
                expired.push(request);
            }
        }
        Ok(expired)
    }
}
