pub mod chats;
pub mod config;
pub mod error;
pub mod forms;
pub mod kind;
pub mod pipeline;
pub mod projection;
pub mod reconcile;
pub mod results;
pub mod store;
pub mod upstream;
pub mod validate;

pub use error::{LaunchpadError, Result};
