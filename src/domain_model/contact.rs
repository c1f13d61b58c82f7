use crate::domain_model::{ContactRequestId, PostId, PostSummary, UserId, UserSummary};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Approved => "approved",
            ContactStatus::Rejected => "rejected",
            ContactStatus::Expired => "expired",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ContactStatus::Rejected | ContactStatus::Expired)
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContactStatus::Pending),
            "approved" => Ok(ContactStatus::Approved),
            "rejected" => Ok(ContactStatus::Rejected),
            "expired" => Ok(ContactStatus::Expired),
            other => Err(format!("unknown contact status: {other}")),
        }
    }
}

/// Outcome a recipient may choose for a pending request.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactDecision {
    Approved,
    Rejected,
}

impl From<ContactDecision> for ContactStatus {
    fn from(decision: ContactDecision) -> Self {
        match decision {
            ContactDecision::Approved => ContactStatus::Approved,
            ContactDecision::Rejected => ContactStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(rename = "_id")]
    pub request_id: ContactRequestId,
    pub requester: UserId,
    pub recipient: UserId,
    pub post_id: PostId,
    pub message: Option<String>,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRequest {
    pub fn new_pending(
        requester: UserId,
        recipient: UserId,
        post_id: PostId,
        message: Option<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            request_id: ContactRequestId::new_v4(),
            requester,
            recipient,
            post_id,
            message,
            status: ContactStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
            updated_at: now,
        }
    }

    /// Status as of `now`: a pending request past its expiry counts as
    /// expired even before the sweeper has rewritten it.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ContactStatus {
        match self.status {
            ContactStatus::Pending if self.expires_at <= now => ContactStatus::Expired,
            status => status,
        }
    }

    fn closed_at(&self) -> DateTime<Utc> {
        match self.status {
            ContactStatus::Pending => self.expires_at,
            _ => self.updated_at,
        }
    }

    /// Time left before the requester may ask again, or `None` when the
    /// request is open, approved, or its cooldown has elapsed.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown: Duration) -> Option<Duration> {
        if !self.effective_status(now).is_closed() {
            return None;
        }
        let remaining = self.closed_at() + cooldown - now;
        (remaining > Duration::zero()).then_some(remaining)
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.requester == user || self.recipient == user
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequestView {
    #[serde(flatten)]
    pub request: ContactRequest,
    pub post: Option<PostSummary>,
    pub counterpart: Option<UserSummary>,
}
