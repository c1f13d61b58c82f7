use crate::application_port::{ChatError, UserError};
use crate::domain_model::*;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("post not found")]
    PostNotFound,
    #[error("contact request not found")]
    NotFound,
    #[error("a contact request for this post already exists")]
    DuplicateRequest,
    #[error("one of the users has blocked the other")]
    Blocked,
    #[error("please wait {} more hour(s) before requesting again", remaining_hours(.remaining))]
    Cooldown { remaining: Duration },
    #[error("only the recipient may decide on this request")]
    Unauthorized,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store error: {0}")]
    Store(String),
}

/// Whole hours left, rounded down but never reported as zero.
pub fn remaining_hours(remaining: &Duration) -> i64 {
    (remaining.num_seconds() / 3600).max(1)
}

impl From<UserError> for ContactError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound => ContactError::InvalidRequest("unknown user".to_owned()),
            UserError::Validation(e) => ContactError::InvalidRequest(e),
            UserError::Store(e) => ContactError::Store(e),
        }
    }
}

impl From<ChatError> for ContactError {
    fn from(err: ChatError) -> Self {
        ContactError::Store(format!("conversation: {err}"))
    }
}

/// Windows applied to the request lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct ContactPolicy {
    pub request_ttl: Duration,
    pub cooldown: Duration,
}

impl Default for ContactPolicy {
    fn default() -> Self {
        Self {
            request_ttl: Duration::days(7),
            cooldown: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateContactInput {
    pub requester: UserId,
    pub post_id: PostId,
    pub recipient: Option<UserId>,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub request: ContactRequest,
    /// Present once the request is approved.
    pub conversation_id: Option<ConversationId>,
}

#[async_trait::async_trait]
pub trait ContactService: Send + Sync {
    async fn create_request(&self, input: CreateContactInput) -> Result<ContactRequest, ContactError>;

    async fn update_status(
        &self,
        request_id: ContactRequestId,
        acting: UserId,
        decision: ContactDecision,
    ) -> Result<StatusUpdate, ContactError>;

    async fn list_received(&self, user_id: UserId) -> Result<Vec<ContactRequestView>, ContactError>;

    async fn list_sent(&self, user_id: UserId) -> Result<Vec<ContactRequestView>, ContactError>;

    async fn delete(&self, request_id: ContactRequestId, acting: UserId) -> Result<(), ContactError>;

    /// Expire overdue pending requests and tell their requesters. Returns
    /// how many requests expired.
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<usize, ContactError>;
}
