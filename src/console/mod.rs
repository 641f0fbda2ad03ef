//! Line-oriented console over the configured stores.

pub mod command;
pub mod session;

pub use command::{Command, CommandError};
pub use session::{Reply, Session};
