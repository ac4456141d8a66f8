//! Moderation events that have their own notification templates.

use std::fmt;

/// Placeholder for the punished user's first name.
pub const FIRST_NAME: &str = "first_name";

/// Placeholder for a human readable restriction length, e.g. "10 minutes".
pub const DURATION_TEXT: &str = "duration_text";

/// A named group of interchangeable notification templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateCategory {
    ReadOnly,
    TextOnly,
    ReadWrite,
    TimeoutKick,
    BanKick,
    UnauthorizedPunishment,
}

impl TemplateCategory {
    pub const ALL: [Self; 6] = [
        Self::ReadOnly,
        Self::TextOnly,
        Self::ReadWrite,
        Self::TimeoutKick,
        Self::BanKick,
        Self::UnauthorizedPunishment,
    ];

    /// Configuration key of the category.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::TextOnly => "text_only",
            Self::ReadWrite => "read_write",
            Self::TimeoutKick => "timeout_kick",
            Self::BanKick => "ban_kick",
            Self::UnauthorizedPunishment => "unauthorized_punishment",
        }
    }

    /// Fields every notification of this category is rendered with.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::ReadOnly | Self::TextOnly | Self::BanKick => &[FIRST_NAME, DURATION_TEXT],
            Self::ReadWrite | Self::TimeoutKick | Self::UnauthorizedPunishment => &[FIRST_NAME],
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
