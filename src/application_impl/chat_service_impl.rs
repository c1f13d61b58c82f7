use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RealChatService {
    conversation_repo: Arc<dyn ConversationRepo>,
    message_repo: Arc<dyn MessageRepo>,
    contact_repo: Arc<dyn ContactRequestRepo>,
    user_repo: Arc<dyn UserRepo>,
    content_safety: Arc<dyn ContentSafety>,
    room_broker: Arc<dyn RoomBroker>,
}

impl RealChatService {
    pub fn new(
        conversation_repo: Arc<dyn ConversationRepo>,
        message_repo: Arc<dyn MessageRepo>,
        contact_repo: Arc<dyn ContactRequestRepo>,
        user_repo: Arc<dyn UserRepo>,
        content_safety: Arc<dyn ContentSafety>,
        room_broker: Arc<dyn RoomBroker>,
    ) -> RealChatService {
        RealChatService {
            conversation_repo,
            message_repo,
            contact_repo,
            user_repo,
            content_safety,
            room_broker,
        }
    }

    fn validate_text(sender: UserId, recipient: UserId, text: &str) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::Validation("message text is empty".to_owned()));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::Validation(format!(
                "message longer than {MAX_MESSAGE_CHARS} characters"
            )));
        }
        if sender == recipient {
            return Err(ChatError::Validation("cannot message yourself".to_owned()));
        }
        Ok(text.to_owned())
    }

    async fn participant_conversation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<ConversationRecord, ChatError> {
        let conversation = self
            .conversation_repo
            .get(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        if !conversation.participants.contains(user_id) {
            return Err(ChatError::NotParticipant);
        }
        Ok(conversation)
    }

    async fn summaries(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserSummary>, ChatError> {
        Ok(self
            .user_repo
            .get_summaries(ids)
            .await?
            .into_iter()
            .map(|u| (u.user_id, u))
            .collect())
    }

    fn view_of(record: MessageRecord, users: &HashMap<UserId, UserSummary>) -> MessageView {
        let sender = users
            .get(&record.sender)
            .cloned()
            .unwrap_or_else(|| UserSummary::unknown(record.sender));
        MessageView::new(record, sender)
    }
}

#[async_trait::async_trait]
impl ChatService for RealChatService {
    async fn send_message(
        &self,
        sender: UserId,
        recipient: UserId,
        text: &str,
    ) -> Result<MessageView, ChatError> {
        let text = Self::validate_text(sender, recipient, text)?;

        let connected = self
            .contact_repo
            .approved_between(sender, recipient)
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;
        if !connected {
            return Err(ChatError::NotConnected);
        }

        let verdict = self
            .content_safety
            .check_safety(&text)
            .await
            .map_err(|e| ChatError::Store(format!("content safety: {e}")))?;
        if !verdict.safe {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "message violates the content policy".to_owned());
            tracing::info!(%sender, "message rejected: {reason}");
            return Err(ChatError::ContentViolation(reason));
        }

        if self.user_repo.is_blocked_either(sender, recipient).await? {
            return Err(ChatError::Blocked);
        }

        let conversation = self.get_or_create_conversation(sender, recipient).await?;
        let record = MessageRecord::new_sent(conversation.conversation_id, sender, text, Utc::now());
        self.message_repo.insert(&record).await?;
        tracing::debug!(
            message_id = %record.message_id,
            conversation_id = %record.conversation_id,
            "message stored"
        );

        let sender_summary = self
            .user_repo
            .get_summary(sender)
            .await?
            .unwrap_or_else(|| UserSummary::unknown(sender));
        let view = MessageView::new(record, sender_summary);

        emit_to_user(
            self.room_broker.as_ref(),
            recipient,
            &S2CEvent::ReceiveMessage(ReceiveMessage {
                conversation_id: view.conversation_id,
                message: view.clone(),
            }),
        )
        .await;

        Ok(view)
    }

    async fn get_or_create_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<ConversationRecord, ChatError> {
        let pair = UserPair::new(a, b);
        if let Some(existing) = self.conversation_repo.find_by_pair(pair).await? {
            return Ok(existing);
        }

        let fresh = ConversationRecord::new(pair, Utc::now());
        match self.conversation_repo.claim(&fresh).await? {
            Claim::Won => {
                tracing::debug!(conversation_id = %fresh.conversation_id, "conversation created");
                Ok(fresh)
            }
            // lost the race; the winner's row is authoritative
            Claim::Existing => self
                .conversation_repo
                .find_by_pair(pair)
                .await?
                .ok_or_else(|| ChatError::Store("conversation vanished after claim".to_owned())),
        }
    }

    async fn peek_conversation(&self, me: UserId, other: UserId) -> Result<ConversationView, ChatError> {
        let other_user = self.user_repo.get_summary(other).await?;
        let Some(conversation) = self
            .conversation_repo
            .find_by_pair(UserPair::new(me, other))
            .await?
        else {
            return Ok(ConversationView::placeholder(me, other, other_user));
        };

        let unread = self
            .message_repo
            .count_unread_by_conversation(me)
            .await?
            .get(&conversation.conversation_id)
            .copied()
            .unwrap_or(0);
        let last_message = match conversation.last_message {
            Some(id) => {
                let records = self.message_repo.get_many(&[id]).await?;
                let users = self.summaries(&[me, other]).await?;
                records.into_iter().next().map(|r| Self::view_of(r, &users))
            }
            None => None,
        };

        Ok(ConversationView {
            conversation_id: Some(conversation.conversation_id),
            participants: vec![me, other],
            other_user,
            last_message,
            unread_count: unread,
            updated_at: Some(conversation.updated_at),
        })
    }

    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<ConversationView>, ChatError> {
        let conversations = self.conversation_repo.list_for_user(user_id).await?;
        if conversations.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<UserId> = conversations
            .iter()
            .filter_map(|c| c.participants.other(user_id))
            .collect();
        ids.push(user_id);
        let users = self.summaries(&ids).await?;

        let last_ids: Vec<MessageId> = conversations.iter().filter_map(|c| c.last_message).collect();
        let mut last_messages: HashMap<MessageId, MessageRecord> = self
            .message_repo
            .get_many(&last_ids)
            .await?
            .into_iter()
            .map(|m| (m.message_id, m))
            .collect();
        let unread = self.message_repo.count_unread_by_conversation(user_id).await?;

        Ok(conversations
            .into_iter()
            .filter_map(|c| {
                let other = c.participants.other(user_id)?;
                Some(ConversationView {
                    conversation_id: Some(c.conversation_id),
                    participants: vec![user_id, other],
                    other_user: users.get(&other).cloned(),
                    last_message: c
                        .last_message
                        .and_then(|id| last_messages.remove(&id))
                        .map(|r| Self::view_of(r, &users)),
                    unread_count: unread.get(&c.conversation_id).copied().unwrap_or(0),
                    updated_at: Some(c.updated_at),
                })
            })
            .collect())
    }

    async fn get_messages(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageView>, ChatError> {
        let conversation = self.participant_conversation(user_id, conversation_id).await?;
        let records = self.message_repo.list_for_conversation(conversation_id).await?;
        let users = self
            .summaries(&[conversation.participants.min(), conversation.participants.max()])
            .await?;
        Ok(records.into_iter().map(|r| Self::view_of(r, &users)).collect())
    }

    async fn mark_read(&self, conversation_id: ConversationId, reader: UserId) -> Result<u64, ChatError> {
        let conversation = self.participant_conversation(reader, conversation_id).await?;
        let changed = self.message_repo.mark_read(conversation_id, reader).await?;
        if changed == 0 {
            return Ok(0);
        }

        if let Some(other) = conversation.participants.other(reader) {
            emit_to_user(
                self.room_broker.as_ref(),
                other,
                &S2CEvent::MessagesRead(MessagesRead {
                    conversation_id,
                    reader_id: reader,
                }),
            )
            .await;
        }
        emit_to_user(self.room_broker.as_ref(), reader, &S2CEvent::UnreadCountUpdate).await;
        Ok(changed)
    }

    async fn total_unread(&self, user_id: UserId) -> Result<u64, ChatError> {
        self.message_repo.count_unread_total(user_id).await
    }

    async fn delete_conversation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<(), ChatError> {
        self.participant_conversation(user_id, conversation_id).await?;
        self.conversation_repo.delete(conversation_id).await?;
        tracing::info!(%conversation_id, %user_id, "conversation deleted");
        Ok(())
    }

    async fn is_participant(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<bool, ChatError> {
        Ok(self
            .conversation_repo
            .get(conversation_id)
            .await?
            .is_some_and(|c| c.participants.contains(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::WordListContentSafety;
    use crate::infra_memory::{MemoryStore, RecordingBroker};
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        broker: Arc<RecordingBroker>,
        svc: RealChatService,
        alice: UserId,
        bob: UserId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let broker = Arc::new(RecordingBroker::default());
        let alice = store.insert_user("Alice", None);
        let bob = store.insert_user("Bob", None);
        let svc = RealChatService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(WordListContentSafety::new(["scam"])),
            broker.clone(),
        );
        Fixture {
            store,
            broker,
            svc,
            alice,
            bob,
        }
    }

    /// Approved request from `a` to `b` on a post owned by `b`.
    async fn connect(f: &Fixture, a: UserId, b: UserId) {
        let post = f.store.insert_post(b, "Desk", None, None);
        let now = Utc::now();
        let mut req = ContactRequest::new_pending(a, b, post, None, now, Duration::days(7));
        req.status = ContactStatus::Approved;
        ContactRequestRepo::claim(f.store.as_ref(), &req).await.unwrap();
    }

    #[tokio::test]
    async fn unconnected_users_cannot_chat() {
        let f = fixture();
        assert!(matches!(
            f.svc.send_message(f.alice, f.bob, "hi").await,
            Err(ChatError::NotConnected)
        ));
        assert!(f.broker.events_for(RoomKey::User(f.bob)).is_empty());
    }

    #[tokio::test]
    async fn validation_runs_first() {
        let f = fixture();
        connect(&f, f.alice, f.bob).await;
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        for bad in ["", "   ", long.as_str()] {
            assert!(matches!(
                f.svc.send_message(f.alice, f.bob, bad).await,
                Err(ChatError::Validation(_))
            ));
        }
        assert!(f.svc.send_message(f.alice, f.bob, &"x".repeat(MAX_MESSAGE_CHARS)).await.is_ok());
    }

    #[tokio::test]
    async fn unsafe_text_is_rejected_and_not_stored() {
        let f = fixture();
        connect(&f, f.alice, f.bob).await;
        assert!(matches!(
            f.svc.send_message(f.alice, f.bob, "this is a SCAM").await,
            Err(ChatError::ContentViolation(_))
        ));
        assert!(f.svc.list_conversations(f.alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blocked_users_cannot_chat() {
        let f = fixture();
        connect(&f, f.alice, f.bob).await;
        UserRepo::block(f.store.as_ref(), f.bob, f.alice).await.unwrap();
        assert!(matches!(
            f.svc.send_message(f.alice, f.bob, "hi").await,
            Err(ChatError::Blocked)
        ));
    }

    #[tokio::test]
    async fn send_delivers_and_reuses_conversation_both_ways() {
        let f = fixture();
        connect(&f, f.alice, f.bob).await;

        let first = f.svc.send_message(f.alice, f.bob, "hello").await.unwrap();
        let reply = f.svc.send_message(f.bob, f.alice, "hey").await.unwrap();
        assert_eq!(first.conversation_id, reply.conversation_id);
        assert_eq!(first.read_by, vec![f.alice]);
        assert_eq!(first.sender.display_name, "Alice");

        let pushed = f.broker.events_for(RoomKey::User(f.bob));
        assert!(matches!(
            pushed.as_slice(),
            [S2CEvent::ReceiveMessage(m)] if m.message.message_id == first.message_id
        ));

        let convs = f.svc.list_conversations(f.alice).await.unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].participants, vec![f.alice, f.bob]);
        assert_eq!(convs[0].unread_count, 1);
        assert_eq!(
            convs[0].last_message.as_ref().map(|m| m.message_id),
            Some(reply.message_id)
        );
    }

    #[tokio::test]
    async fn mark_read_clears_unread_and_notifies_sender() {
        let f = fixture();
        connect(&f, f.alice, f.bob).await;
        let m = f.svc.send_message(f.alice, f.bob, "one").await.unwrap();
        f.svc.send_message(f.alice, f.bob, "two").await.unwrap();
        assert_eq!(f.svc.total_unread(f.bob).await.unwrap(), 2);

        assert_eq!(f.svc.mark_read(m.conversation_id, f.bob).await.unwrap(), 2);
        assert_eq!(f.svc.total_unread(f.bob).await.unwrap(), 0);
        assert_eq!(f.svc.mark_read(m.conversation_id, f.bob).await.unwrap(), 0);

        let to_alice = f.broker.events_for(RoomKey::User(f.alice));
        assert!(matches!(
            to_alice.as_slice(),
            [S2CEvent::MessagesRead(r)] if r.reader_id == f.bob
        ));
        let history = f.svc.get_messages(f.alice, m.conversation_id).await.unwrap();
        assert!(history.iter().all(|m| m.status == DeliveryState::Read));
        assert_eq!(history[0].text, "one");
    }

    #[tokio::test]
    async fn outsiders_cannot_read_or_delete() {
        let f = fixture();
        connect(&f, f.alice, f.bob).await;
        let m = f.svc.send_message(f.alice, f.bob, "psst").await.unwrap();
        let eve = f.store.insert_user("Eve", None);

        assert!(matches!(
            f.svc.get_messages(eve, m.conversation_id).await,
            Err(ChatError::NotParticipant)
        ));
        assert!(!f.svc.is_participant(eve, m.conversation_id).await.unwrap());
        assert!(matches!(
            f.svc.delete_conversation(eve, m.conversation_id).await,
            Err(ChatError::NotParticipant)
        ));

        f.svc.delete_conversation(f.bob, m.conversation_id).await.unwrap();
        assert!(matches!(
            f.svc.get_messages(f.alice, m.conversation_id).await,
            Err(ChatError::ConversationNotFound)
        ));
    }

    #[tokio::test]
    async fn peek_returns_placeholder_without_creating() {
        let f = fixture();
        let view = f.svc.peek_conversation(f.alice, f.bob).await.unwrap();
        assert!(view.conversation_id.is_none());
        assert_eq!(view.participants, vec![f.alice, f.bob]);
        assert_eq!(view.other_user.unwrap().display_name, "Bob");
        assert!(f.svc.list_conversations(f.alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_get_or_create_yields_one_conversation() {
        let f = fixture();
        let (a, b) = tokio::join!(
            f.svc.get_or_create_conversation(f.alice, f.bob),
            f.svc.get_or_create_conversation(f.bob, f.alice),
        );
        assert_eq!(a.unwrap().conversation_id, b.unwrap().conversation_id);
    }
}
