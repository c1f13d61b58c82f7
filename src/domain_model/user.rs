use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};

/// Unordered pair of users, stored smallest-first so `{a, b}` and `{b, a}`
/// compare and hash identically.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn min(&self) -> UserId {
        self.0
    }

    pub fn max(&self) -> UserId {
        self.1
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.0 == user || self.1 == user
    }

    /// The participant that is not `user`, if `user` belongs to the pair.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if self.0 == user {
            Some(self.1)
        } else if self.1 == user {
            Some(self.0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_uri: Option<String>,
}

impl UserSummary {
    /// Placeholder used when the user row has been removed.
    pub fn unknown(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: "Unknown user".to_owned(),
            avatar_uri: None,
        }
    }
}
