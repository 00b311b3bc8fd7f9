//! Request handling for the renderer UI.

pub mod command;
pub mod dispatch;

pub use command::{is_known_command, Command, KNOWN_COMMANDS};
pub use dispatch::Reply;
