//! Verification questions shown to newcomers.

use std::time::Duration;

use thiserror::Error;

use super::ChatUser;

/// Placeholder replaced by the newcomer's mention in question and reply texts.
pub const MENTION_PLACEHOLDER: &str = "{mention}";

/// Timeout used when neither the question nor the source sets one.
pub const DEFAULT_QUESTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Text of the built-in fallback question.
pub const DEFAULT_QUESTION_TEXT: &str = "{mention}, are you a human?";

/// Label of the single option of the built-in fallback question.
pub const DEFAULT_QUESTION_OPTION: &str = "Yes, I am";

/// Reply of the built-in fallback question.
pub const DEFAULT_QUESTION_REPLY: &str = "Welcome, {mention}!";

/// Reasons a question entry is rejected.
#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("question entry has an invalid shape: {0}")]
    Shape(#[from] serde_yaml::Error),

    #[error("question name is missing or empty")]
    MissingName,

    #[error("question '{name}' has no text")]
    MissingText { name: String },

    #[error("question '{name}' has no options")]
    NoOptions { name: String },

    #[error("question '{name}' option #{index} has an empty label")]
    EmptyOptionLabel { name: String, index: usize },

    #[error("question '{name}' option #{index} has no reply text")]
    EmptyReply { name: String, index: usize },
}

/// One answer button of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    /// Button label.
    pub label: String,

    /// Reply sent when this option is chosen.
    pub reply: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(label: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reply: reply.into(),
        }
    }
}

/// An immutable verification question.
///
/// Always has at least one option, and every option has a label and a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    name: String,
    text: String,
    options: Vec<QuestionOption>,
    timeout: Duration,
}

impl Question {
    /// Builds a question, checking its invariants.
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        options: Vec<QuestionOption>,
        timeout: Duration,
    ) -> Result<Self, QuestionError> {
        let name = name.into();
        let text = text.into();

        if name.trim().is_empty() {
            return Err(QuestionError::MissingName);
        }
        if text.trim().is_empty() {
            return Err(QuestionError::MissingText { name });
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions { name });
        }
        for (index, option) in options.iter().enumerate() {
            if option.label.trim().is_empty() {
                return Err(QuestionError::EmptyOptionLabel { name, index });
            }
            if option.reply.trim().is_empty() {
                return Err(QuestionError::EmptyReply { name, index });
            }
        }

        Ok(Self {
            name,
            text,
            options,
            timeout,
        })
    }

    /// The built-in question used when no source is usable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            name: "default".to_owned(),
            text: DEFAULT_QUESTION_TEXT.to_owned(),
            options: vec![QuestionOption::new(
                DEFAULT_QUESTION_OPTION,
                DEFAULT_QUESTION_REPLY,
            )],
            timeout: DEFAULT_QUESTION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw prompt template.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Option keys paired with labels, in button order.
    pub fn buttons(&self) -> impl Iterator<Item = (String, &str)> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, opt)| (i.to_string(), opt.label.as_str()))
    }

    /// Prompt text addressed to `user`.
    #[must_use]
    pub fn render_text(&self, user: &ChatUser) -> String {
        self.text.replace(MENTION_PLACEHOLDER, &user.mention())
    }

    /// Looks up the option for an answer key.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&QuestionOption> {
        key.trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| self.options.get(i))
    }

    /// Reply text for an answer key, addressed to `user`.
    #[must_use]
    pub fn reply_for(&self, key: &str, user: &ChatUser) -> Option<String> {
        self.option(key)
            .map(|opt| opt.reply.replace(MENTION_PLACEHOLDER, &user.mention()))
    }
}
