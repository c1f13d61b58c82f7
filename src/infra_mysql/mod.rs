mod contact_request_repo_mysql;
mod conversation_repo_mysql;
mod message_repo_mysql;
mod notification_repo_mysql;
mod post_repo_mysql;
mod user_repo_mysql;

pub use contact_request_repo_mysql::*;
pub use conversation_repo_mysql::*;
pub use message_repo_mysql::*;
pub use notification_repo_mysql::*;
pub use post_repo_mysql::*;
pub use user_repo_mysql::*;

mod sql_enum;
mod util;
