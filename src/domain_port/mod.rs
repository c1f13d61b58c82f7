// repo

mod contact_request_repo;
mod conversation_repo;
mod message_repo;
mod notification_repo;
mod post_repo;
mod user_repo;

pub use contact_request_repo::*;
pub use conversation_repo::*;
pub use message_repo::*;
pub use notification_repo::*;
pub use post_repo::*;
pub use user_repo::*;

// realtime

mod room_broker;

pub use room_broker::*;

/// Result of an insert guarded by a unique key.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Claim {
    Won,
    Existing,
}
