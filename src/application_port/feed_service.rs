use crate::application_port::ContactError;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("post not found")]
    PostNotFound,
    #[error("only the owner may announce this post")]
    NotOwner,
    #[error("broadcast failed: {0}")]
    Broadcast(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<ContactError> for FeedError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::PostNotFound => FeedError::PostNotFound,
            other => FeedError::Store(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedService: Send + Sync {
    /// Broadcast `new_post` to every live connection. The payload never
    /// carries the owner's phone or WhatsApp number.
    async fn announce(&self, owner: UserId, post_id: PostId) -> Result<PostSummary, FeedError>;
}
