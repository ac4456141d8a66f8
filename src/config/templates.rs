//! Notification template configuration and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::notification::{TemplateCategory, TemplateFieldError, placeholders};

/// Errors that can occur while loading or validating templates.
#[derive(Debug, Error)]
pub enum TemplateConfigError {
    #[error("Category '{category}' has no templates")]
    EmptyCategory { category: TemplateCategory },

    #[error("Template #{index} of '{category}' is empty")]
    EmptyTemplate {
        category: TemplateCategory,
        index: usize,
    },

    #[error("Template #{index} of '{category}' uses '{{{field}}}', which this category does not provide")]
    UnknownPlaceholder {
        category: TemplateCategory,
        index: usize,
        field: String,
    },

    #[error("Template #{index} of '{category}' is malformed: {source}")]
    Malformed {
        category: TemplateCategory,
        index: usize,
        #[source]
        source: TemplateFieldError,
    },

    #[error("Failed to read templates file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse templates file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Template lists for every notification category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationTemplates {
    pub read_only: Vec<String>,
    pub text_only: Vec<String>,
    pub read_write: Vec<String>,
    pub timeout_kick: Vec<String>,
    pub ban_kick: Vec<String>,
    pub unauthorized_punishment: Vec<String>,
}

impl NotificationTemplates {
    /// Loads templates from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, TemplateConfigError> {
        let content = std::fs::read_to_string(path)?;
        let templates: Self = serde_json::from_str(&content)?;
        Ok(templates)
    }

    /// Loads templates from a JSON file, using the built-in set when the
    /// file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, TemplateConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "Templates file {} not found, using built-in templates",
                path.display()
            );
            return Ok(Self::example());
        }
        Self::load_from_file(path)
    }

    /// Saves templates to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), TemplateConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Templates of one category.
    #[must_use]
    pub fn get(&self, category: TemplateCategory) -> &[String] {
        match category {
            TemplateCategory::ReadOnly => &self.read_only,
            TemplateCategory::TextOnly => &self.text_only,
            TemplateCategory::ReadWrite => &self.read_write,
            TemplateCategory::TimeoutKick => &self.timeout_kick,
            TemplateCategory::BanKick => &self.ban_kick,
            TemplateCategory::UnauthorizedPunishment => &self.unauthorized_punishment,
        }
    }

    /// Validates every category, returning the first problem.
    pub fn validate(&self) -> Result<(), TemplateConfigError> {
        self.validate_all().into_iter().find(Result::is_err).unwrap_or(Ok(()))
    }

    /// Returns one result per template, plus one per empty category.
    #[must_use]
    pub fn validate_all(&self) -> Vec<Result<(), TemplateConfigError>> {
        let mut results = Vec::new();

        for category in TemplateCategory::ALL {
            let templates = self.get(category);
            if templates.is_empty() {
                results.push(Err(TemplateConfigError::EmptyCategory { category }));
                continue;
            }

            for (index, template) in templates.iter().enumerate() {
                results.push(check_template(category, index, template));
            }
        }

        results
    }

    /// Total number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        TemplateCategory::ALL
            .iter()
            .map(|&category| self.get(category).len())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Built-in templates, also used as an example file.
    #[must_use]
    pub fn example() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|&s| s.to_owned()).collect()
        }

        Self {
            read_only: owned(&[
                "{first_name} is now in read-only mode for {duration_text}.",
                "{first_name}, take a break and just read for {duration_text}.",
                "Silence is golden, {first_name}. Enjoy it for {duration_text}.",
            ]),
            text_only: owned(&[
                "{first_name} can send text only for {duration_text}.",
                "No media for {first_name} during the next {duration_text}.",
                "{first_name}, words only please, for {duration_text}.",
            ]),
            read_write: owned(&[
                "{first_name} can write again.",
                "Welcome back to the conversation, {first_name}!",
                "{first_name}'s restrictions have been lifted.",
            ]),
            timeout_kick: owned(&[
                "{first_name} did not answer in time and was removed.",
                "{first_name} stayed silent, so we said goodbye.",
                "No answer from {first_name}. Kicked.",
            ]),
            ban_kick: owned(&[
                "{first_name} is banned for {duration_text}.",
                "{first_name} leaves us for {duration_text}.",
                "See you in {duration_text}, {first_name}.",
            ]),
            unauthorized_punishment: owned(&[
                "{first_name}, only admins can do that. Read-only for you.",
                "Nice try, {first_name}. Now rest a little.",
                "{first_name} tried to moderate without permission.",
            ]),
        }
    }
}

fn check_template(
    category: TemplateCategory,
    index: usize,
    template: &str,
) -> Result<(), TemplateConfigError> {
    if template.trim().is_empty() {
        return Err(TemplateConfigError::EmptyTemplate { category, index });
    }

    let used = placeholders(template).map_err(|source| TemplateConfigError::Malformed {
        category,
        index,
        source,
    })?;

    if let Some(field) = used.into_iter().find(|field| !category.fields().iter().any(|known| known == field)) {
        return Err(TemplateConfigError::UnknownPlaceholder {
            category,
            index,
            field: field.to_owned(),
        });
    }

    Ok(())
}
