mod error;
mod handler;
mod router;

pub use error::{ApiErrorCode, ApiRejection, recover_error};
pub use router::routes;
