//! Newcomer verification: questions and pending admissions.
//!
//! A joining user gets a random [`Question`] from the [`QuestionCatalog`] and
//! is tracked in the [`NewbieRegistry`] until they answer or time out.

mod catalog;
mod question;
mod registry;
mod types;

pub use catalog::{CatalogLoadError, EXAMPLE_QUESTIONS, QuestionCatalog};
pub use question::{
    DEFAULT_QUESTION_OPTION, DEFAULT_QUESTION_REPLY, DEFAULT_QUESTION_TEXT,
    DEFAULT_QUESTION_TIMEOUT, MENTION_PLACEHOLDER, Question, QuestionError, QuestionOption,
};
pub use registry::{NewbieRegistry, PendingAdmission, RegistryError};
pub use types::{ChatId, ChatUser, MessageRef, UserId};
