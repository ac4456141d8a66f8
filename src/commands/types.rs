//! Command types and definitions.

use std::fmt;
use std::time::Duration;

use super::duration::{format_duration, parse_duration};

/// Available chat commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationCommand {
    /// Forbid the replied-to member from writing.
    ReadOnly(Option<Duration>),

    /// Allow the replied-to member text messages only.
    TextOnly(Option<Duration>),

    /// Lift restrictions of the replied-to member.
    ReadWrite,

    /// Ban the replied-to member.
    Ban(Option<Duration>),

    /// List newcomers who have not answered yet.
    Pending,

    /// Reload the greeting questions file.
    Reload,

    /// Show help information.
    Help,
}

impl ModerationCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the message is not a valid command. A `@botname`
    /// suffix on the command word is ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let after_slash = text.strip_prefix('/')?;

        let (cmd, args) = match after_slash.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, Some(args.trim())),
            None => (after_slash, None),
        };
        let cmd = cmd.split('@').next().unwrap_or(cmd).to_lowercase();
        let args = args.filter(|a| !a.is_empty());

        match cmd.as_str() {
            "ro" | "readonly" => Self::parse_timed(args).map(Self::ReadOnly),
            "to" | "textonly" => Self::parse_timed(args).map(Self::TextOnly),
            "rw" | "readwrite" => Some(Self::ReadWrite),
            "ban" => Self::parse_timed(args).map(Self::Ban),
            "pending" | "newbies" => Some(Self::Pending),
            "reload" | "refresh" => Some(Self::Reload),
            "help" | "h" => Some(Self::Help),
            _ => None,
        }
    }

    /// Optional duration argument; an unparsable one rejects the command.
    fn parse_timed(args: Option<&str>) -> Option<Option<Duration>> {
        match args.and_then(|a| a.split_whitespace().next()) {
            None => Some(None),
            Some(arg) => parse_duration(arg).map(Some),
        }
    }

    /// Whether only chat admins may use the command.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        !matches!(self, Self::Pending | Self::Help)
    }

    /// Whether the command acts on the member being replied to.
    #[must_use]
    pub const fn needs_target(&self) -> bool {
        matches!(
            self,
            Self::ReadOnly(_) | Self::TextOnly(_) | Self::ReadWrite | Self::Ban(_)
        )
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadOnly(_) => "ro",
            Self::TextOnly(_) => "to",
            Self::ReadWrite => "rw",
            Self::Ban(_) => "ban",
            Self::Pending => "pending",
            Self::Reload => "reload",
            Self::Help => "help",
        }
    }

    /// Returns all available commands with their descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("/ro [time]", "Read-only mode for the replied-to member"),
            ("/to [time]", "Text-only mode for the replied-to member"),
            ("/rw", "Lift restrictions of the replied-to member"),
            ("/ban [time]", "Ban the replied-to member"),
            ("/pending", "List newcomers awaiting verification"),
            ("/reload", "Reload greeting questions"),
            ("/help", "Show this help message"),
        ]
    }
}

impl fmt::Display for ModerationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly(Some(d)) | Self::TextOnly(Some(d)) | Self::Ban(Some(d)) => {
                write!(f, "/{} {}", self.name(), format_duration(*d))
            }
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to post in the chat.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
