use crate::application_port::UserError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_summary(&self, user_id: UserId) -> Result<Option<UserSummary>, UserError>;

    async fn get_summaries(&self, user_ids: &[UserId]) -> Result<Vec<UserSummary>, UserError>;

    /// True when `a` blocked `b` or `b` blocked `a`.
    async fn is_blocked_either(&self, a: UserId, b: UserId) -> Result<bool, UserError>;

    async fn block(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError>;

    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError>;

    async fn list_blocked(&self, blocker: UserId) -> Result<Vec<UserId>, UserError>;
}
