//! Configuration module for the guard bot.
//!
//! Handles runtime settings and the notification template lists.
//! Greeting questions live in [`crate::greeting`].

mod settings;
mod templates;

pub use settings::BotSettings;
pub use templates::{NotificationTemplates, TemplateConfigError};
