mod contact_request_repo_memory;
mod conversation_repo_memory;
mod message_repo_memory;
mod notification_repo_memory;
mod post_repo_memory;
mod seed;
mod store;
mod user_repo_memory;

pub use seed::*;
pub use store::*;

#[cfg(test)]
mod recording_broker;

#[cfg(test)]
pub use recording_broker::*;
