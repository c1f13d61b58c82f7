mod auth_service_fake;
mod auth_service_jwt;
mod chat_service_impl;
mod contact_service_impl;
mod content_safety_impl;
mod feed_service_impl;
mod notification_service_impl;
mod user_service_impl;

pub use auth_service_fake::*;
pub use auth_service_jwt::*;
pub use chat_service_impl::*;
pub use contact_service_impl::*;
pub use content_safety_impl::*;
pub use feed_service_impl::*;
pub use notification_service_impl::*;
pub use user_service_impl::*;
