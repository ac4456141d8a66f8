//! Command handling module.
//!
//! Processes moderation commands posted in the group chat.

mod duration;
mod handler;
mod types;

pub use duration::{format_duration, parse_duration};
pub use handler::CommandHandler;
pub use types::{CommandResult, ModerationCommand};
