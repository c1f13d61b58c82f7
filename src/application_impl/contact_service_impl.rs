use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub struct RealContactService {
    contact_repo: Arc<dyn ContactRequestRepo>,
    post_repo: Arc<dyn PostRepo>,
    user_repo: Arc<dyn UserRepo>,
    chat_service: Arc<dyn ChatService>,
    notification_service: Arc<dyn NotificationService>,
    policy: ContactPolicy,
}

impl RealContactService {
    pub fn new(
        contact_repo: Arc<dyn ContactRequestRepo>,
        post_repo: Arc<dyn PostRepo>,
        user_repo: Arc<dyn UserRepo>,
        chat_service: Arc<dyn ChatService>,
        notification_service: Arc<dyn NotificationService>,
        policy: ContactPolicy,
    ) -> RealContactService {
        RealContactService {
            contact_repo,
            post_repo,
            user_repo,
            chat_service,
            notification_service,
            policy,
        }
    }

    /// Rejects the attempt while an earlier request for the same post is
    /// open, approved, or still cooling down. A request whose cooldown has
    /// elapsed is removed so the new one can take its key.
    async fn clear_previous(
        &self,
        post_id: PostId,
        requester: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ContactError> {
        let Some(previous) = self
            .contact_repo
            .find_by_post_and_requester(post_id, requester)
            .await?
        else {
            return Ok(());
        };

        match previous.effective_status(now) {
            ContactStatus::Pending | ContactStatus::Approved => Err(ContactError::DuplicateRequest),
            ContactStatus::Rejected | ContactStatus::Expired => {
                if let Some(remaining) = previous.cooldown_remaining(now, self.policy.cooldown) {
                    return Err(ContactError::Cooldown { remaining });
                }
                self.contact_repo.delete(previous.request_id).await?;
                tracing::debug!(request_id = %previous.request_id, "stale request replaced");
                Ok(())
            }
        }
    }

    /// Attach post details and the other party's profile. Contact details
    /// are only revealed once the request is approved.
    async fn to_views(
        &self,
        requests: Vec<ContactRequest>,
        viewer: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContactRequestView>, ContactError> {
        let post_ids: Vec<PostId> = requests.iter().map(|r| r.post_id).collect();
        let user_ids: Vec<UserId> = requests
            .iter()
            .map(|r| if r.requester == viewer { r.recipient } else { r.requester })
            .collect();

        let posts: HashMap<PostId, PostSummary> = self
            .post_repo
            .get_summaries(&post_ids)
            .await?
            .into_iter()
            .map(|p| (p.post_id, p))
            .collect();
        let users: HashMap<UserId, UserSummary> = self
            .user_repo
            .get_summaries(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.user_id, u))
            .collect();

        Ok(requests
            .into_iter()
            .map(|mut request| {
                request.status = request.effective_status(now);
                let counterpart_id = if request.requester == viewer {
                    request.recipient
                } else {
                    request.requester
                };
                let post = posts.get(&request.post_id).cloned().map(|p| {
                    if request.status == ContactStatus::Approved {
                        p
                    } else {
                        p.without_contact_details()
                    }
                });
                ContactRequestView {
                    post,
                    counterpart: users.get(&counterpart_id).cloned(),
                    request,
                }
            })
            .collect())
    }

    /// Repeating the decision a request already carries is a no-op; any
    /// other change to a settled request conflicts.
    async fn already_decided(
        &self,
        request: ContactRequest,
        target: ContactStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdate, ContactError> {
        let current = request.effective_status(now);
        if current != target {
            return Err(ContactError::Conflict(format!("request is already {current}")));
        }
        let conversation_id = match target {
            ContactStatus::Approved => Some(
                self.chat_service
                    .get_or_create_conversation(request.requester, request.recipient)
                    .await?
                    .conversation_id,
            ),
            _ => None,
        };
        Ok(StatusUpdate {
            request,
            conversation_id,
        })
    }

    async fn on_approved(&self, request: &ContactRequest) -> Result<ConversationId, ContactError> {
        let conversation = self
            .chat_service
            .get_or_create_conversation(request.requester, request.recipient)
            .await?;

        self.notification_service
            .notify(NotificationDraft {
                recipient: request.requester,
                sender: Some(request.recipient),
                kind: NotificationKind::Approval {
                    request_id: request.request_id,
                    conversation_id: conversation.conversation_id,
                },
                title: "Contact request approved".to_owned(),
                message: "Your contact request was approved. You can now chat.".to_owned(),
                link: Some(format!("/chat/{}", conversation.conversation_id)),
            })
            .await;

        Ok(conversation.conversation_id)
    }
}

#[async_trait::async_trait]
impl ContactService for RealContactService {
    async fn create_request(&self, input: CreateContactInput) -> Result<ContactRequest, ContactError> {
        let now = Utc::now();

        let post = self
            .post_repo
            .get_summary(input.post_id)
            .await?
            .ok_or(ContactError::PostNotFound)?;
        if post.owner == input.requester {
            return Err(ContactError::InvalidRequest(
                "cannot request contact on your own post".to_owned(),
            ));
        }
        if let Some(recipient) = input.recipient
            && recipient != post.owner
        {
            return Err(ContactError::InvalidRequest(
                "recipient must be the post owner".to_owned(),
            ));
        }
        let message = input
            .message
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty());

        if self
            .user_repo
            .is_blocked_either(input.requester, post.owner)
            .await?
        {
            return Err(ContactError::Blocked);
        }

        self.clear_previous(post.post_id, input.requester, now).await?;

        let request = ContactRequest::new_pending(
            input.requester,
            post.owner,
            post.post_id,
            message,
            now,
            self.policy.request_ttl,
        );
        if self.contact_repo.claim(&request).await? == Claim::Existing {
            return Err(ContactError::DuplicateRequest);
        }
        tracing::info!(
            request_id = %request.request_id,
            requester = %request.requester,
            post_id = %request.post_id,
            "contact request created"
        );

        self.notification_service
            .notify(NotificationDraft {
                recipient: request.recipient,
                sender: Some(request.requester),
                kind: NotificationKind::Request {
                    request_id: request.request_id,
                    post_id: request.post_id,
                },
                title: "New contact request".to_owned(),
                message: format!("Someone wants to contact you about \"{}\".", post.title),
                link: Some("/contacts/received".to_owned()),
            })
            .await;

        Ok(request)
    }

    async fn update_status(
        &self,
        request_id: ContactRequestId,
        acting: UserId,
        decision: ContactDecision,
    ) -> Result<StatusUpdate, ContactError> {
        let now = Utc::now();
        let mut request = self
            .contact_repo
            .get(request_id)
            .await?
            .ok_or(ContactError::NotFound)?;
        if request.recipient != acting {
            return Err(ContactError::Unauthorized);
        }

        let target = ContactStatus::from(decision);
        if request.effective_status(now) != ContactStatus::Pending {
            return self.already_decided(request, target, now).await;
        }

        if !self.contact_repo.settle_pending(request_id, target, now).await? {
            // another decision or the sweeper got there first
            let settled = self
                .contact_repo
                .get(request_id)
                .await?
                .ok_or(ContactError::NotFound)?;
            return self.already_decided(settled, target, now).await;
        }
        request.status = target;
        request.updated_at = now;
        tracing::info!(%request_id, status = %target, "contact request decided");

        let conversation_id = match decision {
            ContactDecision::Approved => Some(self.on_approved(&request).await?),
            ContactDecision::Rejected => {
                self.notification_service
                    .notify(NotificationDraft {
                        recipient: request.requester,
                        sender: Some(request.recipient),
                        kind: NotificationKind::Info {
                            request_id: Some(request.request_id),
                            post_id: Some(request.post_id),
                        },
                        title: "Contact request declined".to_owned(),
                        message: "The owner declined your contact request.".to_owned(),
                        link: None,
                    })
                    .await;
                None
            }
        };

        Ok(StatusUpdate {
            request,
            conversation_id,
        })
    }

    async fn list_received(&self, user_id: UserId) -> Result<Vec<ContactRequestView>, ContactError> {
        let requests = self.contact_repo.list_by_recipient(user_id).await?;
        self.to_views(requests, user_id, Utc::now()).await
    }

    async fn list_sent(&self, user_id: UserId) -> Result<Vec<ContactRequestView>, ContactError> {
        let requests = self.contact_repo.list_by_requester(user_id).await?;
        self.to_views(requests, user_id, Utc::now()).await
    }

    async fn delete(&self, request_id: ContactRequestId, acting: UserId) -> Result<(), ContactError> {
        let request = self
            .contact_repo
            .get(request_id)
            .await?
            .ok_or(ContactError::NotFound)?;
        if !request.involves(acting) {
            return Err(ContactError::Unauthorized);
        }
        if !self.contact_repo.delete(request_id).await? {
            return Err(ContactError::NotFound);
        }
        Ok(())
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<usize, ContactError> {
        let expired = self.contact_repo.expire_due(now).await?;
        for request in &expired {
            self.notification_service
                .notify(NotificationDraft {
                    recipient: request.requester,
                    sender: None,
                    kind: NotificationKind::Info {
                        request_id: Some(request.request_id),
                        post_id: Some(request.post_id),
                    },
                    title: "Contact request expired".to_owned(),
                    message: "Your contact request expired without a response.".to_owned(),
                    link: None,
                })
                .await;
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale contact requests");
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{RealChatService, RealNotificationService, WordListContentSafety};
    use crate::infra_memory::{MemoryStore, RecordingBroker};
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        svc: RealContactService,
        owner: UserId,
        buyer: UserId,
        post: PostId,
    }

    fn fixture(policy: ContactPolicy) -> Fixture {
        fixture_with(policy, |store| store)
    }

    fn fixture_with(
        policy: ContactPolicy,
        contacts: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn ContactRequestRepo>,
    ) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let broker = Arc::new(RecordingBroker::default());
        let owner = store.insert_user("Olive", None);
        let buyer = store.insert_user("Bruno", None);
        let post = store.insert_post(owner, "Road bike", Some("+100"), None);

        let notifications: Arc<dyn NotificationService> =
            Arc::new(RealNotificationService::new(store.clone(), broker.clone()));
        let chat: Arc<dyn ChatService> = Arc::new(RealChatService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(WordListContentSafety::new(Vec::<String>::new())),
            broker,
        ));
        let svc = RealContactService::new(
            contacts(store.clone()),
            store.clone(),
            store.clone(),
            chat,
            notifications,
            policy,
        );
        Fixture {
            store,
            svc,
            owner,
            buyer,
            post,
        }
    }

    /// Hands control back to the scheduler after every read so two
    /// decisions on the same request both see it pending.
    struct YieldingReads(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl ContactRequestRepo for YieldingReads {
        async fn claim(&self, request: &ContactRequest) -> Result<Claim, ContactError> {
            ContactRequestRepo::claim(self.0.as_ref(), request).await
        }

        async fn get(&self, request_id: ContactRequestId) -> Result<Option<ContactRequest>, ContactError> {
            let found = ContactRequestRepo::get(self.0.as_ref(), request_id).await;
            tokio::task::yield_now().await;
            found
        }

        async fn find_by_post_and_requester(
            &self,
            post_id: PostId,
            requester: UserId,
        ) -> Result<Option<ContactRequest>, ContactError> {
            self.0.find_by_post_and_requester(post_id, requester).await
        }

        async fn settle_pending(
            &self,
            request_id: ContactRequestId,
            status: ContactStatus,
            at: DateTime<Utc>,
        ) -> Result<bool, ContactError> {
            self.0.settle_pending(request_id, status, at).await
        }

        async fn delete(&self, request_id: ContactRequestId) -> Result<bool, ContactError> {
            ContactRequestRepo::delete(self.0.as_ref(), request_id).await
        }

        async fn list_by_recipient(&self, recipient: UserId) -> Result<Vec<ContactRequest>, ContactError> {
            self.0.list_by_recipient(recipient).await
        }

        async fn list_by_requester(&self, requester: UserId) -> Result<Vec<ContactRequest>, ContactError> {
            self.0.list_by_requester(requester).await
        }

        async fn approved_between(&self, a: UserId, b: UserId) -> Result<bool, ContactError> {
            self.0.approved_between(a, b).await
        }

        async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<ContactRequest>, ContactError> {
            self.0.expire_due(now).await
        }
    }

    async fn unread(f: &Fixture, user: UserId) -> u64 {
        NotificationRepo::count_unread(f.store.as_ref(), user).await.unwrap()
    }

    fn input(f: &Fixture) -> CreateContactInput {
        CreateContactInput {
            requester: f.buyer,
            post_id: f.post,
            recipient: None,
            message: Some("  still available?  ".to_owned()),
        }
    }

    #[tokio::test]
    async fn create_then_duplicate() {
        let f = fixture(ContactPolicy::default());
        let req = f.svc.create_request(input(&f)).await.unwrap();
        assert_eq!(req.status, ContactStatus::Pending);
        assert_eq!(req.recipient, f.owner);
        assert_eq!(req.message.as_deref(), Some("still available?"));
        assert_eq!(req.expires_at - req.created_at, Duration::days(7));

        assert!(matches!(
            f.svc.create_request(input(&f)).await,
            Err(ContactError::DuplicateRequest)
        ));
        assert_eq!(unread(&f, f.owner).await, 1);
    }

    #[tokio::test]
    async fn own_post_and_wrong_recipient_are_invalid() {
        let f = fixture(ContactPolicy::default());
        let own = CreateContactInput {
            requester: f.owner,
            ..input(&f)
        };
        assert!(matches!(
            f.svc.create_request(own).await,
            Err(ContactError::InvalidRequest(_))
        ));

        let wrong = CreateContactInput {
            recipient: Some(UserId::new_v4()),
            ..input(&f)
        };
        assert!(matches!(
            f.svc.create_request(wrong).await,
            Err(ContactError::InvalidRequest(_))
        ));

        let missing = CreateContactInput {
            post_id: PostId::new_v4(),
            ..input(&f)
        };
        assert!(matches!(
            f.svc.create_request(missing).await,
            Err(ContactError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn block_in_either_direction_stops_requests() {
        let f = fixture(ContactPolicy::default());
        UserRepo::block(f.store.as_ref(), f.owner, f.buyer).await.unwrap();
        assert!(matches!(
            f.svc.create_request(input(&f)).await,
            Err(ContactError::Blocked)
        ));
    }

    #[tokio::test]
    async fn block_is_checked_before_a_stale_request_is_replaced() {
        let f = fixture(ContactPolicy::default());
        let first = f.svc.create_request(input(&f)).await.unwrap();
        // declined two days ago, so the cooldown is over
        assert!(ContactRequestRepo::settle_pending(
            f.store.as_ref(),
            first.request_id,
            ContactStatus::Rejected,
            Utc::now() - Duration::hours(48),
        )
        .await
        .unwrap());
        UserRepo::block(f.store.as_ref(), f.owner, f.buyer).await.unwrap();

        assert!(matches!(
            f.svc.create_request(input(&f)).await,
            Err(ContactError::Blocked)
        ));
        let kept = ContactRequestRepo::get(f.store.as_ref(), first.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.status, ContactStatus::Rejected);
    }

    #[tokio::test]
    async fn rejected_request_cools_down_then_can_be_replaced() {
        let f = fixture(ContactPolicy {
            request_ttl: Duration::days(7),
            cooldown: Duration::zero(),
        });
        let first = f.svc.create_request(input(&f)).await.unwrap();
        f.svc
            .update_status(first.request_id, f.owner, ContactDecision::Rejected)
            .await
            .unwrap();

        let second = f.svc.create_request(input(&f)).await.unwrap();
        assert_ne!(first.request_id, second.request_id);
        assert!(ContactRequestRepo::get(f.store.as_ref(), first.request_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rejected_request_within_cooldown_reports_hours() {
        let f = fixture(ContactPolicy::default());
        let first = f.svc.create_request(input(&f)).await.unwrap();
        f.svc
            .update_status(first.request_id, f.owner, ContactDecision::Rejected)
            .await
            .unwrap();

        match f.svc.create_request(input(&f)).await {
            Err(err @ ContactError::Cooldown { .. }) => {
                // 23h59m and change left
                assert!(err.to_string().contains("23 more hour"));
            }
            other => panic!("expected cooldown, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn approve_is_recipient_only_and_idempotent() {
        let f = fixture(ContactPolicy::default());
        let req = f.svc.create_request(input(&f)).await.unwrap();

        assert!(matches!(
            f.svc
                .update_status(req.request_id, f.buyer, ContactDecision::Approved)
                .await,
            Err(ContactError::Unauthorized)
        ));

        let first = f
            .svc
            .update_status(req.request_id, f.owner, ContactDecision::Approved)
            .await
            .unwrap();
        let again = f
            .svc
            .update_status(req.request_id, f.owner, ContactDecision::Approved)
            .await
            .unwrap();
        assert_eq!(first.request.status, ContactStatus::Approved);
        assert!(first.conversation_id.is_some());
        assert_eq!(first.conversation_id, again.conversation_id);
        // one approval notification only
        assert_eq!(unread(&f, f.buyer).await, 1);

        assert!(matches!(
            f.svc
                .update_status(req.request_id, f.owner, ContactDecision::Rejected)
                .await,
            Err(ContactError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn racing_decisions_settle_once() {
        let f = fixture_with(ContactPolicy::default(), |store| Arc::new(YieldingReads(store)));
        let req = f.svc.create_request(input(&f)).await.unwrap();

        let (approve, reject) = tokio::join!(
            f.svc
                .update_status(req.request_id, f.owner, ContactDecision::Approved),
            f.svc
                .update_status(req.request_id, f.owner, ContactDecision::Rejected),
        );
        let approved = approve.unwrap();
        assert_eq!(approved.request.status, ContactStatus::Approved);
        assert!(matches!(reject, Err(ContactError::Conflict(_))));

        let stored = ContactRequestRepo::get(f.store.as_ref(), req.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ContactStatus::Approved);
        assert_eq!(unread(&f, f.buyer).await, 1);
    }

    #[tokio::test]
    async fn repeated_approvals_in_flight_notify_once() {
        let f = fixture_with(ContactPolicy::default(), |store| Arc::new(YieldingReads(store)));
        let req = f.svc.create_request(input(&f)).await.unwrap();

        let (a, b) = tokio::join!(
            f.svc
                .update_status(req.request_id, f.owner, ContactDecision::Approved),
            f.svc
                .update_status(req.request_id, f.owner, ContactDecision::Approved),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.conversation_id.is_some());
        assert_eq!(a.conversation_id, b.conversation_id);
        assert_eq!(unread(&f, f.buyer).await, 1);
    }

    #[tokio::test]
    async fn lapsed_request_cannot_be_settled() {
        let f = fixture(ContactPolicy::default());
        let req = f.svc.create_request(input(&f)).await.unwrap();

        let after_expiry = req.expires_at + Duration::seconds(1);
        assert!(!ContactRequestRepo::settle_pending(
            f.store.as_ref(),
            req.request_id,
            ContactStatus::Approved,
            after_expiry,
        )
        .await
        .unwrap());
        assert!(matches!(
            ContactRequestRepo::settle_pending(
                f.store.as_ref(),
                ContactRequestId::new_v4(),
                ContactStatus::Approved,
                Utc::now(),
            )
            .await,
            Err(ContactError::NotFound)
        ));
    }

    #[tokio::test]
    async fn views_hide_contact_details_until_approved() {
        let f = fixture(ContactPolicy::default());
        let req = f.svc.create_request(input(&f)).await.unwrap();

        let sent = f.svc.list_sent(f.buyer).await.unwrap();
        assert_eq!(sent.len(), 1);
        let post = sent[0].post.as_ref().unwrap();
        assert!(post.contact_phone.is_none());
        assert_eq!(sent[0].counterpart.as_ref().unwrap().user_id, f.owner);

        f.svc
            .update_status(req.request_id, f.owner, ContactDecision::Approved)
            .await
            .unwrap();
        let sent = f.svc.list_sent(f.buyer).await.unwrap();
        assert_eq!(
            sent[0].post.as_ref().unwrap().contact_phone.as_deref(),
            Some("+100")
        );

        let received = f.svc.list_received(f.owner).await.unwrap();
        assert_eq!(received[0].counterpart.as_ref().unwrap().user_id, f.buyer);
    }

    #[tokio::test]
    async fn expire_stale_flips_and_notifies_once() {
        let f = fixture(ContactPolicy::default());
        let req = f.svc.create_request(input(&f)).await.unwrap();

        let later = req.expires_at + Duration::seconds(1);
        assert_eq!(f.svc.expire_stale(later).await.unwrap(), 1);
        assert_eq!(f.svc.expire_stale(later).await.unwrap(), 0);
        assert_eq!(
            ContactRequestRepo::get(f.store.as_ref(), req.request_id)
                .await
                .unwrap()
                .unwrap()
                .status,
            ContactStatus::Expired
        );
        assert_eq!(unread(&f, f.buyer).await, 1);

        assert!(matches!(
            f.svc
                .update_status(req.request_id, f.owner, ContactDecision::Approved)
                .await,
            Err(ContactError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_requires_a_party() {
        let f = fixture(ContactPolicy::default());
        let req = f.svc.create_request(input(&f)).await.unwrap();
        assert!(matches!(
            f.svc.delete(req.request_id, UserId::new_v4()).await,
            Err(ContactError::Unauthorized)
        ));
        f.svc.delete(req.request_id, f.buyer).await.unwrap();
        assert!(matches!(
            f.svc.delete(req.request_id, f.buyer).await,
            Err(ContactError::NotFound)
        ));
    }
}
