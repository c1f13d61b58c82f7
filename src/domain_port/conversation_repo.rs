use crate::application_port::ChatError;
use crate::domain_model::*;
use crate::domain_port::Claim;

#[async_trait::async_trait]
pub trait ConversationRepo: Send + Sync {
    /// Insert unless a conversation for the same participant pair exists.
    async fn claim(&self, conversation: &ConversationRecord) -> Result<Claim, ChatError>;

    async fn find_by_pair(&self, pair: UserPair) -> Result<Option<ConversationRecord>, ChatError>;

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<ConversationRecord>, ChatError>;

    /// Most recently updated first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConversationRecord>, ChatError>;

    /// Removes the conversation together with its messages.
    async fn delete(&self, conversation_id: ConversationId) -> Result<(), ChatError>;
}
