use crate::domain_model::{UserId, UserSummary};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_summary(&self, user_id: UserId) -> Result<UserSummary, UserError>;

    /// Idempotent. Blocking has effect in both directions.
    async fn block(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError>;

    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError>;

    async fn list_blocked(&self, blocker: UserId) -> Result<Vec<UserSummary>, UserError>;
}
