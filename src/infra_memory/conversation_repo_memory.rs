use super::MemoryStore;
use crate::application_port::ChatError;
use crate::domain_model::*;
use crate::domain_port::{Claim, ConversationRepo};

#[async_trait::async_trait]
impl ConversationRepo for MemoryStore {
    async fn claim(&self, conversation: &ConversationRecord) -> Result<Claim, ChatError> {
        let mut state = self.lock();
        if state
            .conversations
            .values()
            .any(|c| c.participants == conversation.participants)
        {
            return Ok(Claim::Existing);
        }
        state
            .conversations
            .insert(conversation.conversation_id, conversation.clone());
        Ok(Claim::Won)
    }

    async fn find_by_pair(&self, pair: UserPair) -> Result<Option<ConversationRecord>, ChatError> {
        Ok(self
            .lock()
            .conversations
            .values()
            .find(|c| c.participants == pair)
            .cloned())
    }

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<ConversationRecord>, ChatError> {
        Ok(self.lock().conversations.get(&conversation_id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConversationRecord>, ChatError> {
        let mut found: Vec<ConversationRecord> = self
            .lock()
            .conversations
            .values()
            .filter(|c| c.participants.contains(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn delete(&self, conversation_id: ConversationId) -> Result<(), ChatError> {
        let mut state = self.lock();
        if state.conversations.remove(&conversation_id).is_none() {
            return Err(ChatError::ConversationNotFound);
        }
        state
            .messages
            .retain(|_, m| m.conversation_id != conversation_id);
        Ok(())
    }
}
