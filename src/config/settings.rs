//! Application settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Path to the greeting questions YAML file.
    #[serde(default = "default_questions_path")]
    pub questions_path: PathBuf,

    /// Path to the notification templates JSON file.
    #[serde(default = "default_templates_path")]
    pub templates_path: PathBuf,

    /// Restriction length used when a moderation command gives none.
    #[serde(default = "default_restrict_secs")]
    pub default_restrict_secs: u64,

    /// Read-only time for members who use moderation commands without rights.
    #[serde(default = "default_punishment_secs")]
    pub punishment_secs: u64,
}

fn default_questions_path() -> PathBuf {
    PathBuf::from("greeting_questions.yaml")
}

fn default_templates_path() -> PathBuf {
    PathBuf::from("notifications.json")
}

fn default_restrict_secs() -> u64 {
    3600 // 1 hour
}

fn default_punishment_secs() -> u64 {
    1800 // 30 minutes
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            questions_path: default_questions_path(),
            templates_path: default_templates_path(),
            default_restrict_secs: default_restrict_secs(),
            punishment_secs: default_punishment_secs(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            questions_path: std::env::var("QUESTIONS_PATH")
                .map_or_else(|_| default_questions_path(), PathBuf::from),
            templates_path: std::env::var("NOTIFICATIONS_PATH")
                .map_or_else(|_| default_templates_path(), PathBuf::from),
            default_restrict_secs: env_secs("DEFAULT_RESTRICT_SECS")
                .unwrap_or_else(default_restrict_secs),
            punishment_secs: env_secs("PUNISHMENT_SECS").unwrap_or_else(default_punishment_secs),
        }
    }

    #[must_use]
    pub const fn default_restrict(&self) -> Duration {
        Duration::from_secs(self.default_restrict_secs)
    }

    #[must_use]
    pub const fn punishment(&self) -> Duration {
        Duration::from_secs(self.punishment_secs)
    }
}

/// Positive number of seconds from an environment variable.
fn env_secs(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|&secs| secs > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.questions_path, PathBuf::from("greeting_questions.yaml"));
        assert_eq!(settings.templates_path, PathBuf::from("notifications.json"));
        assert_eq!(settings.default_restrict(), Duration::from_secs(3600));
        assert_eq!(settings.punishment(), Duration::from_secs(1800));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let settings: BotSettings =
            serde_json::from_str(r#"{"punishment_secs": 60}"#).unwrap();
        assert_eq!(settings.punishment_secs, 60);
        assert_eq!(settings.default_restrict_secs, 3600);
    }

    #[test]
    fn test_logging_is_not_a_setting() {
        let value = serde_json::to_value(BotSettings::default()).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["default_restrict_secs", "punishment_secs", "questions_path", "templates_path"]
        );
    }
}
