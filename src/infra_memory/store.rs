use crate::domain_model::*;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub(super) struct State {
    pub users: HashMap<UserId, UserSummary>,
    pub posts: HashMap<PostId, PostSummary>,
    /// (blocker, blocked)
    pub blocks: HashSet<(UserId, UserId)>,
    pub contact_requests: HashMap<ContactRequestId, ContactRequest>,
    pub conversations: HashMap<ConversationId, ConversationRecord>,
    pub messages: HashMap<MessageId, MessageRecord>,
    pub notifications: HashMap<NotificationId, NotificationRecord>,
}

/// Process-local backend implementing every repository port. Unique-key
/// checks and the writes they guard run under one lock, so concurrent
/// claims resolve to exactly one winner.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, State> {
        // a panicking writer leaves plain data behind; keep serving it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a user profile. Profiles are owned by the account system;
    /// this is how seeds and tests provide them.
    pub fn insert_user(&self, display_name: &str, avatar_uri: Option<&str>) -> UserId {
        let user = UserSummary {
            user_id: UserId::new_v4(),
            display_name: display_name.to_owned(),
            avatar_uri: avatar_uri.map(str::to_owned),
        };
        let id = user.user_id;
        self.put_user(user);
        id
    }

    pub fn put_user(&self, user: UserSummary) {
        self.lock().users.insert(user.user_id, user);
    }

    pub fn insert_post(
        &self,
        owner: UserId,
        title: &str,
        contact_phone: Option<&str>,
        whatsapp: Option<&str>,
    ) -> PostId {
        let post = PostSummary {
            post_id: PostId::new_v4(),
            owner,
            title: title.to_owned(),
            contact_phone: contact_phone.map(str::to_owned),
            whatsapp: whatsapp.map(str::to_owned),
        };
        let id = post.post_id;
        self.put_post(post);
        id
    }

    pub fn put_post(&self, post: PostSummary) {
        self.lock().posts.insert(post.post_id, post);
    }
}

/// Newest first by `created_at`.
pub(super) fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}
