//! Moderation notifications.
//!
//! Every moderation event has a category of interchangeable templates. The
//! [`NotificationService`] rotates through them so chat members do not see
//! the same text twice in a row.

mod category;
mod rotator;
mod service;
mod template;

pub use category::{DURATION_TEXT, FIRST_NAME, TemplateCategory};
pub use rotator::TemplateRotator;
pub use service::NotificationService;
pub use template::{TemplateFieldError, placeholders, render};
