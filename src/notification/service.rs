//! Ready-to-send texts for moderation events.

use std::collections::HashMap;

use tracing::error;

use super::category::{DURATION_TEXT, FIRST_NAME, TemplateCategory};
use super::rotator::TemplateRotator;
use super::template::{TemplateFieldError, render};
use crate::config::NotificationTemplates;

/// Formats moderation notices, rotating templates within each category.
#[derive(Debug)]
pub struct NotificationService {
    rotator: TemplateRotator<TemplateCategory>,
    fields: HashMap<TemplateCategory, &'static [&'static str]>,
}

impl NotificationService {
    #[must_use]
    pub fn new(templates: &NotificationTemplates) -> Self {
        let rotator = TemplateRotator::new(
            TemplateCategory::ALL
                .into_iter()
                .map(|category| (category, templates.get(category).to_vec())),
        );
        let fields = TemplateCategory::ALL
            .into_iter()
            .map(|category| (category, category.fields()))
            .collect();

        Self { rotator, fields }
    }

    /// Draws the next template of `category` and fills in `fields`.
    ///
    /// All fields the category is configured with must be supplied.
    pub fn format(
        &self,
        category: TemplateCategory,
        fields: &[(&str, &str)],
    ) -> Result<String, TemplateFieldError> {
        let result = self.try_format(category, fields);
        if let Err(e) = &result {
            error!("Notification template defect in '{}': {}", category, e);
        }
        result
    }

    fn try_format(
        &self,
        category: TemplateCategory,
        fields: &[(&str, &str)],
    ) -> Result<String, TemplateFieldError> {
        let required = self.fields.get(&category).copied().unwrap_or_default();
        if let Some(missing) = required
            .iter()
            .find(|&&name| !fields.iter().any(|(key, _)| *key == name))
        {
            return Err(TemplateFieldError::MissingField {
                field: (*missing).to_owned(),
            });
        }

        let template = self
            .rotator
            .draw(category)
            .ok_or(TemplateFieldError::NoTemplates {
                category: category.name(),
            })?;
        render(template, fields)
    }

    fn restriction(
        &self,
        category: TemplateCategory,
        first_name: &str,
        duration_text: &str,
    ) -> Result<String, TemplateFieldError> {
        self.format(
            category,
            &[(FIRST_NAME, first_name), (DURATION_TEXT, duration_text)],
        )
    }

    fn simple(
        &self,
        category: TemplateCategory,
        first_name: &str,
    ) -> Result<String, TemplateFieldError> {
        self.format(category, &[(FIRST_NAME, first_name)])
    }

    pub fn read_only(&self, first_name: &str, duration_text: &str) -> Result<String, TemplateFieldError> {
        self.restriction(TemplateCategory::ReadOnly, first_name, duration_text)
    }

    pub fn text_only(&self, first_name: &str, duration_text: &str) -> Result<String, TemplateFieldError> {
        self.restriction(TemplateCategory::TextOnly, first_name, duration_text)
    }

    pub fn ban_kick(&self, first_name: &str, duration_text: &str) -> Result<String, TemplateFieldError> {
        self.restriction(TemplateCategory::BanKick, first_name, duration_text)
    }

    pub fn read_write(&self, first_name: &str) -> Result<String, TemplateFieldError> {
        self.simple(TemplateCategory::ReadWrite, first_name)
    }

    pub fn timeout_kick(&self, first_name: &str) -> Result<String, TemplateFieldError> {
        self.simple(TemplateCategory::TimeoutKick, first_name)
    }

    pub fn unauthorized_punishment(&self, first_name: &str) -> Result<String, TemplateFieldError> {
        self.simple(TemplateCategory::UnauthorizedPunishment, first_name)
    }
}
