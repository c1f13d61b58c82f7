mod auth_service;
mod chat_service;
mod contact_service;
mod content_safety;
mod feed_service;
mod notification_service;
mod user_service;

pub use auth_service::*;
pub use chat_service::*;
pub use contact_service::*;
pub use content_safety::*;
pub use feed_service::*;
pub use notification_service::*;
pub use user_service::*;
