use crate::domain_model::{ContactRequestId, ConversationId, NotificationId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification type together with the entity it points at. The `type`
/// discriminant decides which reference is carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NotificationKind {
    Request {
        request_id: ContactRequestId,
        post_id: PostId,
    },
    Approval {
        request_id: ContactRequestId,
        conversation_id: ConversationId,
    },
    Info {
        request_id: Option<ContactRequestId>,
        post_id: Option<PostId>,
    },
    Message {
        conversation_id: ConversationId,
    },
    Like {
        post_id: PostId,
    },
    Comment {
        post_id: PostId,
    },
    System,
}

impl NotificationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NotificationKind::Request { .. } => "request",
            NotificationKind::Approval { .. } => "approval",
            NotificationKind::Info { .. } => "info",
            NotificationKind::Message { .. } => "message",
            NotificationKind::Like { .. } => "like",
            NotificationKind::Comment { .. } => "comment",
            NotificationKind::System => "system",
        }
    }
}

/// Input accepted by the notification fan-out.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub recipient: UserId,
    pub sender: Option<UserId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(rename = "_id")]
    pub notification_id: NotificationId,
    pub recipient: UserId,
    pub sender: Option<UserId>,
    #[serde(flatten)]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn from_draft(draft: NotificationDraft, now: DateTime<Utc>) -> Self {
        Self {
            notification_id: NotificationId::new_v4(),
            recipient: draft.recipient,
            sender: draft.sender,
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            link: draft.link,
            read: false,
            created_at: now,
        }
    }
}
