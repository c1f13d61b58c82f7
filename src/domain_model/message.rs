use crate::domain_model::{ConversationId, MessageId, UserId, UserSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Sent,
    Read,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Sent => "sent",
            DeliveryState::Read => "read",
        }
    }
}

impl FromStr for DeliveryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(DeliveryState::Sent),
            "read" => Ok(DeliveryState::Read),
            other => Err(format!("unknown delivery state: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserId,
    pub text: String,
    pub status: DeliveryState,
    pub read_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// A freshly sent message; its author has read it by definition.
    pub fn new_sent(
        conversation_id: ConversationId,
        sender: UserId,
        text: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id: MessageId::new_v4(),
            conversation_id,
            sender,
            text,
            status: DeliveryState::Sent,
            read_by: vec![sender],
            created_at: now,
        }
    }

    pub fn is_unread_for(&self, user: UserId) -> bool {
        self.sender != user && !self.read_by.contains(&user)
    }
}

/// Message with the sender's display fields populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserSummary,
    pub text: String,
    pub status: DeliveryState,
    pub read_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(record: MessageRecord, sender: UserSummary) -> Self {
        Self {
            message_id: record.message_id,
            conversation_id: record.conversation_id,
            sender,
            text: record.text,
            status: record.status,
            read_by: record.read_by,
            created_at: record.created_at,
        }
    }
}
