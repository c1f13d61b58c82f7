use crate::domain_model::{ConversationId, MessageId, MessageView, UserId, UserPair, UserSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub conversation_id: ConversationId,
    pub participants: UserPair,
    pub last_message: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(participants: UserPair, now: DateTime<Utc>) -> Self {
        Self {
            conversation_id: ConversationId::new_v4(),
            participants,
            last_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    #[serde(rename = "_id")]
    pub conversation_id: Option<ConversationId>,
    /// Viewer first, counterpart second.
    pub participants: Vec<UserId>,
    pub other_user: Option<UserSummary>,
    pub last_message: Option<MessageView>,
    pub unread_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConversationView {
    /// Shape returned for a pair that has never exchanged a message.
    pub fn placeholder(me: UserId, other: UserId, other_user: Option<UserSummary>) -> Self {
        Self {
            conversation_id: None,
            participants: vec![me, other],
            other_user,
            last_message: None,
            unread_count: 0,
            updated_at: None,
        }
    }
}
