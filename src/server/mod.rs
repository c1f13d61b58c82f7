mod backplane;
mod expiry_sweeper;
#[cfg(feature = "kafka")]
mod kafka;
mod local_rooms;
mod port;
mod server;
mod session_hub;

pub use backplane::*;
pub use expiry_sweeper::*;
#[cfg(feature = "kafka")]
pub use kafka::*;
pub use local_rooms::*;
pub use port::*;
pub use server::*;
pub use session_hub::*;
