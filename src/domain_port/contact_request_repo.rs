use crate::application_port::ContactError;
use crate::domain_model::*;
use crate::domain_port::Claim;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait ContactRequestRepo: Send + Sync {
    /// Insert unless a request for the same (post, requester) already exists.
    async fn claim(&self, request: &ContactRequest) -> Result<Claim, ContactError>;

    async fn get(&self, request_id: ContactRequestId) -> Result<Option<ContactRequest>, ContactError>;

    async fn find_by_post_and_requester(
        &self,
        post_id: PostId,
        requester: UserId,
    ) -> Result<Option<ContactRequest>, ContactError>;

    /// Move a still-pending, unexpired request to `status`. Returns false
    /// when the request was already settled or had lapsed by `at`.
    async fn settle_pending(
        &self,
        request_id: ContactRequestId,
        status: ContactStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ContactError>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, request_id: ContactRequestId) -> Result<bool, ContactError>;

    /// Newest first.
    async fn list_by_recipient(&self, recipient: UserId) -> Result<Vec<ContactRequest>, ContactError>;

    /// Newest first.
    async fn list_by_requester(&self, requester: UserId) -> Result<Vec<ContactRequest>, ContactError>;

    /// Whether an approved request links the two users, in either direction.
    async fn approved_between(&self, a: UserId, b: UserId) -> Result<bool, ContactError>;

    /// Flip every pending request whose expiry is at or before `now` to
    /// expired, returning the rows that changed.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<ContactRequest>, ContactError>;
}
