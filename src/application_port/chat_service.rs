use crate::application_port::UserError;
use crate::domain_model::*;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("no approved contact request between these users")]
    NotConnected,
    #[error("message rejected by content policy: {0}")]
    ContentViolation(String),
    #[error("one of the users has blocked the other")]
    Blocked,
    #[error("conversation not found")]
    ConversationNotFound,
    #[error("user not a participant of conversation")]
    NotParticipant,
    #[error("store error: {0}")]
    Store(String),
}

impl From<UserError> for ChatError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound => ChatError::Validation("unknown user".to_owned()),
            UserError::Validation(e) => ChatError::Validation(e),
            UserError::Store(e) => ChatError::Store(e),
        }
    }
}

#[async_trait::async_trait]
pub trait ChatService: Send + Sync {
    /// Authorise, moderate, persist and deliver one message.
    async fn send_message(
        &self,
        sender: UserId,
        recipient: UserId,
        text: &str,
    ) -> Result<MessageView, ChatError>;

    /// Same record for `(a, b)` and `(b, a)`; creates it on first use.
    async fn get_or_create_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<ConversationRecord, ChatError>;

    /// Existing conversation with `other`, or a placeholder; never creates.
    async fn peek_conversation(&self, me: UserId, other: UserId) -> Result<ConversationView, ChatError>;

    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<ConversationView>, ChatError>;

    /// Chronological; participants only.
    async fn get_messages(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageView>, ChatError>;

    async fn mark_read(&self, conversation_id: ConversationId, reader: UserId) -> Result<u64, ChatError>;

    async fn total_unread(&self, user_id: UserId) -> Result<u64, ChatError>;

    async fn delete_conversation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<(), ChatError>;

    async fn is_participant(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<bool, ChatError>;
}
