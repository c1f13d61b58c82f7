use crate::domain_model::*;
use serde::{Deserialize, Serialize};

// region client -> server

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum C2SCommand {
    Join(UserId),
    TypingStart(TypingSignal),
    TypingStop(TypingSignal),
    JoinConversation(ConversationId),
    LeaveConversation(ConversationId),
    ReadMessages(ConversationId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignal {
    pub recipient_id: Option<UserId>,
    pub conversation_id: ConversationId,
}

// endregion

// region server -> client

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum S2CEvent {
    ReceiveMessage(ReceiveMessage),
    MessagesRead(MessagesRead),
    UnreadCountUpdate,
    UserTyping(TypingRelay),
    UserStopTyping(TypingRelay),
    NewNotification(NotificationRecord),
    NewPost(PostSummary),
    UserOnline(UserId),
    UserOffline(UserId),
    Error(ProtocolError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveMessage {
    pub conversation_id: ConversationId,
    pub message: MessageView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRead {
    pub conversation_id: ConversationId,
    pub reader_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRelay {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolError {
    pub message: String,
}

// endregion

// region rooms

/// Addressing key for a group of live connections.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum RoomKey {
    /// Every live connection; presence and feed broadcasts go here.
    Everyone,
    User(UserId),
    Conversation(ConversationId),
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomKey::Everyone => f.write_str("everyone"),
            RoomKey::User(id) => write!(f, "user:{id}"),
            RoomKey::Conversation(id) => write!(f, "conversation:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub uuid::Uuid);

impl ConnectionId {
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// endregion
