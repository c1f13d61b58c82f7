use super::{MemoryStore, newest_first};
use crate::application_port::ContactError;
use crate::domain_model::*;
use crate::domain_port::{Claim, ContactRequestRepo};
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
impl ContactRequestRepo for MemoryStore {
    async fn claim(&self, request: &ContactRequest) -> Result<Claim, ContactError> {
        let mut state = self.lock();
        let taken = state
            .contact_requests
            .values()
            .any(|r| r.post_id == request.post_id && r.requester == request.requester);
        if taken {
            return Ok(Claim::Existing);
        }
        state
            .contact_requests
            .insert(request.request_id, request.clone());
        Ok(Claim::Won)
    }

    async fn get(&self, request_id: ContactRequestId) -> Result<Option<ContactRequest>, ContactError> {
        Ok(self.lock().contact_requests.get(&request_id).cloned())
    }

    async fn find_by_post_and_requester(
        &self,
        post_id: PostId,
        requester: UserId,
    ) -> Result<Option<ContactRequest>, ContactError> {
        Ok(self
            .lock()
            .contact_requests
            .values()
            .find(|r| r.post_id == post_id && r.requester == requester)
            .cloned())
    }

    async fn settle_pending(
        &self,
        request_id: ContactRequestId,
        status: ContactStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, ContactError> {
        let mut state = self.lock();
        let request = state
            .contact_requests
            .get_mut(&request_id)
            .ok_or(ContactError::NotFound)?;
        if request.effective_status(at) != ContactStatus::Pending {
            return Ok(false);
        }
        request.status = status;
        request.updated_at = at;
        Ok(true)
    }

    async fn delete(&self, request_id: ContactRequestId) -> Result<bool, ContactError> {
        Ok(self.lock().contact_requests.remove(&request_id).is_some())
    }

    async fn list_by_recipient(&self, recipient: UserId) -> Result<Vec<ContactRequest>, ContactError> {
        let found = self
            .lock()
            .contact_requests
            .values()
            .filter(|r| r.recipient == recipient)
            .cloned()
            .collect();
        Ok(newest_first(found, |r| r.created_at))
    }

    async fn list_by_requester(&self, requester: UserId) -> Result<Vec<ContactRequest>, ContactError> {
        let found = self
            .lock()
            .contact_requests
            .values()
            .filter(|r| r.requester == requester)
            .cloned()
            .collect();
        Ok(newest_first(found, |r| r.created_at))
    }

    async fn approved_between(&self, a: UserId, b: UserId) -> Result<bool, ContactError> {
        Ok(self.lock().contact_requests.values().any(|r| {
            r.status == ContactStatus::Approved
                && ((r.requester == a && r.recipient == b) || (r.requester == b && r.recipient == a))
        }))
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<ContactRequest>, ContactError> {
        let mut state = self.lock();
        let mut expired = Vec::new();
        for request in state.contact_requests.values_mut() {
            if request.status == ContactStatus::Pending && request.expires_at <= now {
                request.status = ContactStatus::Expired;
                request.updated_at = now;
                expired.push(request.clone());
            }
        }
        Ok(expired)
    }
}
