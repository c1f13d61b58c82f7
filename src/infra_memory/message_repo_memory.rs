use super::MemoryStore;
use crate::application_port::ChatError;
use crate::domain_model::*;
use crate::domain_port::MessageRepo;
use std::collections::HashMap;

#[async_trait::async_trait]
impl MessageRepo for MemoryStore {
    async fn insert(&self, message: &MessageRecord) -> Result<(), ChatError> {
        let mut state = self.lock();
        let conversation = state
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(ChatError::ConversationNotFound)?;
        conversation.last_message = Some(message.message_id);
        conversation.updated_at = message.created_at;
        state.messages.insert(message.message_id, message.clone());
        Ok(())
    }

    async fn get_many(&self, message_ids: &[MessageId]) -> Result<Vec<MessageRecord>, ChatError> {
        let state = self.lock();
        Ok(message_ids
            .iter()
            .filter_map(|id| state.messages.get(id).cloned())
            .collect())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        let mut found: Vec<MessageRecord> = self
            .lock()
            .messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });
        Ok(found)
    }

    async fn mark_read(&self, conversation_id: ConversationId, reader: UserId) -> Result<u64, ChatError> {
        let mut state = self.lock();
        let mut changed = 0;
        for message in state
            .messages
            .values_mut()
            .filter(|m| m.conversation_id == conversation_id && m.is_unread_for(reader))
        {
            message.read_by.push(reader);
            message.status = DeliveryState::Read;
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_unread_total(&self, user_id: UserId) -> Result<u64, ChatError> {
        Ok(self
            .count_unread_by_conversation(user_id)
            .await?
            .values()
            .sum())
    }

    async fn count_unread_by_conversation(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<ConversationId, u64>, ChatError> {
        let state = self.lock();
        let mut counts = HashMap::new();
        for message in state.messages.values() {
            let Some(conversation) = state.conversations.get(&message.conversation_id) else {
                continue;
            };
            if conversation.participants.contains(user_id) && message.is_unread_for(user_id) {
                *counts.entry(message.conversation_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
