mod contact;
mod conversation;
mod key;
mod message;
mod notification;
mod post;
mod stream;
mod user;

pub use contact::*;
pub use conversation::*;
pub use key::*;
pub use message::*;
pub use notification::*;
pub use post::*;
pub use stream::*;
pub use user::*;
