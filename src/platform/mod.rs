//! Chat platform abstraction.
//!
//! The guard logic only talks to the network through [`ChatPlatform`] and
//! only hears from it through [`ChatEvent`]s.

mod console;
#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::greeting::{ChatId, ChatUser, MessageRef, UserId};

pub use console::ConsolePlatform;

/// Errors reported by a chat platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request rejected by platform: {0}")]
    Rejected(String),

    #[error("Message {0:?} not found")]
    MessageNotFound(MessageRef),
}

/// Something that happened in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A user joined the chat.
    Joined { chat: ChatId, user: ChatUser },

    /// A user pressed an answer button.
    Answered {
        chat: ChatId,
        user: ChatUser,
        key: String,
    },

    /// A plain text message, possibly replying to another user's message.
    Message {
        chat: ChatId,
        from: ChatUser,
        reply_to: Option<ChatUser>,
        text: String,
    },
}

/// Member permission change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanction {
    /// No messages at all.
    ReadOnly(Duration),
    /// Text messages only, no media.
    TextOnly(Duration),
    /// Lift restrictions.
    ReadWrite,
    /// Remove from chat and keep out.
    Ban(Duration),
}

/// Outbound side of a chat platform.
pub trait ChatPlatform: Send + Sync + 'static {
    /// Sends a question with one button per `(key, label)` pair.
    fn send_question(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[(String, String)],
    ) -> impl Future<Output = Result<MessageRef, PlatformError>> + Send;

    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
    ) -> impl Future<Output = Result<MessageRef, PlatformError>> + Send;

    fn delete_message(
        &self,
        message: MessageRef,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Removes a user without banning them.
    fn kick(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn apply_sanction(
        &self,
        chat: ChatId,
        user: UserId,
        sanction: Sanction,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn is_admin(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> impl Future<Output = Result<bool, PlatformError>> + Send;
}
