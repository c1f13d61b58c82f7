use crate::application_port::ChatError;
use crate::domain_model::*;
use std::collections::HashMap;

#[async_trait::async_trait]
pub trait MessageRepo: Send + Sync {
    /// Persist the message and advance the conversation's last-message
    /// pointer and update time.
    async fn insert(&self, message: &MessageRecord) -> Result<(), ChatError>;

    async fn get_many(&self, message_ids: &[MessageId]) -> Result<Vec<MessageRecord>, ChatError>;

    /// Oldest first.
    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageRecord>, ChatError>;

    /// Add `reader` to every message in the conversation it did not author
    /// and has not read yet, and flip those messages to read. Returns how
    /// many messages changed.
    async fn mark_read(&self, conversation_id: ConversationId, reader: UserId) -> Result<u64, ChatError>;

    /// Unread messages across all of the user's conversations.
    async fn count_unread_total(&self, user_id: UserId) -> Result<u64, ChatError>;

    /// Unread messages per conversation; conversations with none are absent.
    async fn count_unread_by_conversation(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<ConversationId, u64>, ChatError>;
}
