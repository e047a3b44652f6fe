pub mod errors;
pub mod id;

pub use errors::{ConfigError, ParlorError};
pub use id::{new_connection_id, ConnectionId};

pub type Result<T> = std::result::Result<T, ParlorError>;
