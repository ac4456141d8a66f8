//! Question catalog loaded from a YAML document.
//!
//! Document shape:
//!
//! ```yaml
//! global_question_timeout: 90
//! questions:
//!   - name: sky
//!     text: "{mention}, what color is the sky?"
//!     question_timeout: 45
//!     options:
//!       - option_text: Blue
//!         reply_text: "Welcome, {mention}!"
//! ```
//!
//! Broken entries are skipped one by one. When nothing usable remains the
//! catalog serves the built-in fallback question, so it is never empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::question::{DEFAULT_QUESTION_TIMEOUT, Question, QuestionError, QuestionOption};

/// Example questions document, written by the validator on request.
pub const EXAMPLE_QUESTIONS: &str = r#"# Greeting questions for newcomers.
# {mention} is replaced with the newcomer's @username or first name.
global_question_timeout: 60
questions:
  - name: sky
    text: "Hi {mention}! What color is a clear daytime sky?"
    options:
      - option_text: Blue
        reply_text: "Welcome aboard, {mention}!"
      - option_text: Green
        reply_text: "Close enough, {mention}. Welcome!"
  - name: human
    text: "{mention}, please confirm you are a human."
    question_timeout: 90
    options:
      - option_text: "I am a human"
        reply_text: "Thanks, {mention}, have fun!"
"#;

/// Errors that make a whole question source unusable.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("Failed to read questions file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed questions file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Questions document is not a mapping")]
    NotAMapping,

    #[error("'questions' is not a list")]
    QuestionsNotAList,

    #[error("No valid questions found")]
    NoValidQuestions,
}

// Text fields stay untyped so that `option_text: 4` is read as "4".
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
    #[serde(default)]
    question_timeout: Option<i64>,
    #[serde(default)]
    options: Option<Vec<RawOption>>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    option_text: Option<Value>,
    #[serde(default)]
    reply_text: Option<Value>,
}

/// Reloadable set of verification questions.
#[derive(Debug)]
pub struct QuestionCatalog {
    source: PathBuf,
    questions: RwLock<Arc<Vec<Question>>>,
}

impl QuestionCatalog {
    /// Opens the catalog, falling back to the built-in question when the
    /// source cannot be used.
    pub fn open(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let questions = match Self::load(&source) {
            Ok(questions) => {
                info!("Loaded {} greeting questions from {}", questions.len(), source.display());
                questions
            }
            Err(e) => {
                error!("Load greeting questions error: {}. Using default question", e);
                vec![Question::fallback()]
            }
        };

        Self {
            source,
            questions: RwLock::new(Arc::new(questions)),
        }
    }

    /// Creates a catalog from questions already in memory.
    ///
    /// An empty list is replaced by the built-in question.
    #[must_use]
    pub fn from_questions(source: impl Into<PathBuf>, questions: Vec<Question>) -> Self {
        let questions = if questions.is_empty() {
            vec![Question::fallback()]
        } else {
            questions
        };
        Self {
            source: source.into(),
            questions: RwLock::new(Arc::new(questions)),
        }
    }

    /// Loads and validates questions from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Question>, CatalogLoadError> {
        let entries = Self::inspect(path)?;
        Self::keep_valid(entries)
    }

    /// Parses and validates questions from YAML text.
    pub fn parse(content: &str) -> Result<Vec<Question>, CatalogLoadError> {
        let entries = Self::inspect_str(content)?;
        Self::keep_valid(entries)
    }

    /// Returns the validation outcome of every entry in a questions file.
    pub fn inspect(
        path: impl AsRef<Path>,
    ) -> Result<Vec<Result<Question, QuestionError>>, CatalogLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::inspect_str(&content)
    }

    /// Returns the validation outcome of every entry in YAML text.
    pub fn inspect_str(
        content: &str,
    ) -> Result<Vec<Result<Question, QuestionError>>, CatalogLoadError> {
        let document: Value = serde_yaml::from_str(content)?;
        let Value::Mapping(mut document) = document else {
            return Err(CatalogLoadError::NotAMapping);
        };

        let global_timeout = resolve_global_timeout(document.get("global_question_timeout"));

        let entries = match document.remove("questions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(entries)) => entries,
            Some(_) => return Err(CatalogLoadError::QuestionsNotAList),
        };

        Ok(entries
            .into_iter()
            .map(|entry| build_question(entry, global_timeout))
            .collect())
    }

    fn keep_valid(
        entries: Vec<Result<Question, QuestionError>>,
    ) -> Result<Vec<Question>, CatalogLoadError> {
        let mut result = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match entry {
                Ok(question) => result.push(question),
                Err(e) => error!("Malformed question #{} found, skipping it: {}", index, e),
            }
        }

        if result.is_empty() {
            return Err(CatalogLoadError::NoValidQuestions);
        }
        Ok(result)
    }

    /// Re-reads the source; the active set is only replaced on success.
    pub async fn reload(&self) -> Result<usize, CatalogLoadError> {
        let questions = match Self::load(&self.source) {
            Ok(questions) => questions,
            Err(e) => {
                warn!("Reload of {} failed, keeping current questions: {}", self.source.display(), e);
                return Err(e);
            }
        };

        let count = questions.len();
        *self.questions.write().await = Arc::new(questions);
        info!("Reloaded {} greeting questions", count);
        Ok(count)
    }

    /// Picks a question uniformly at random.
    pub async fn random_question(&self) -> Question {
        let questions = self.snapshot().await;
        let question = questions
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(Question::fallback);
        debug!("Picked greeting question '{}'", question.name());
        question
    }

    /// Currently active questions.
    pub async fn snapshot(&self) -> Arc<Vec<Question>> {
        Arc::clone(&*self.questions.read().await)
    }

    pub async fn len(&self) -> usize {
        self.questions.read().await.len()
    }

    /// Always false: the catalog keeps at least the fallback question.
    pub async fn is_empty(&self) -> bool {
        self.questions.read().await.is_empty()
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn resolve_global_timeout(value: Option<&Value>) -> Duration {
    match value {
        None | Some(Value::Null) => DEFAULT_QUESTION_TIMEOUT,
        Some(value) => match value.as_i64().and_then(positive_secs) {
            Some(timeout) => timeout,
            None => {
                warn!(
                    "Invalid global_question_timeout {:?}, using {}s",
                    value,
                    DEFAULT_QUESTION_TIMEOUT.as_secs()
                );
                DEFAULT_QUESTION_TIMEOUT
            }
        },
    }
}

fn positive_secs(secs: i64) -> Option<Duration> {
    u64::try_from(secs)
        .ok()
        .filter(|&s| s > 0)
        .map(Duration::from_secs)
}

fn build_question(entry: Value, global_timeout: Duration) -> Result<Question, QuestionError> {
    let raw: RawQuestion = serde_yaml::from_value(entry)?;
    let name = scalar_text(raw.name);

    // Non-positive per-question timeouts fall back to the document default.
    let timeout = match raw.question_timeout {
        None => global_timeout,
        Some(secs) => positive_secs(secs).unwrap_or_else(|| {
            warn!(
                "Question '{}' has non-positive timeout {}, using {}s",
                name,
                secs,
                global_timeout.as_secs()
            );
            global_timeout
        }),
    };

    let options = raw
        .options
        .unwrap_or_default()
        .into_iter()
        .map(|opt| {
            QuestionOption::new(scalar_text(opt.option_text), scalar_text(opt.reply_text))
        })
        .collect();

    Question::new(name, scalar_text(raw.text), options, timeout)
}

/// Display text of a scalar; empty for nulls and collections, which the
/// question constructor then rejects as missing.
fn scalar_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Tagged(tagged)) => scalar_text(Some(tagged.value)),
        Some(Value::Null | Value::Sequence(_) | Value::Mapping(_)) | None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_ENTRIES_ONE_BROKEN: &str = r#"
global_question_timeout: 90
questions:
  - name: sky
    text: "{mention}, what color is the sky?"
    question_timeout: 45
    options:
      - option_text: Blue
        reply_text: "Welcome, {mention}!"
      - option_text: Green
        reply_text: "Are you sure, {mention}?"
  - name: broken
    text: "Missing reply"
    options:
      - option_text: Yes
  - name: math
    text: "2 + 2 = ?"
    options:
      - option_text: "4"
        reply_text: "Correct"
"#;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "newbie_guard_{}_{}.yaml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_example_document_is_valid() {
        let questions = QuestionCatalog::parse(EXAMPLE_QUESTIONS).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_entry_is_skipped() {
        let questions = QuestionCatalog::parse(THREE_ENTRIES_ONE_BROKEN).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].name(), "sky");
        assert_eq!(questions[1].name(), "math");
    }

    #[test]
    fn test_timeout_resolution_order() {
        let questions = QuestionCatalog::parse(THREE_ENTRIES_ONE_BROKEN).unwrap();
        assert_eq!(questions[0].timeout(), Duration::from_secs(45));
        assert_eq!(questions[1].timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_default_timeout_without_global() {
        let questions = QuestionCatalog::parse(
            "questions:\n  - name: q\n    text: t\n    options:\n      - option_text: a\n        reply_text: b\n",
        )
        .unwrap();
        assert_eq!(questions[0].timeout(), DEFAULT_QUESTION_TIMEOUT);
    }

    #[test]
    fn test_non_positive_timeout_falls_back() {
        let questions = QuestionCatalog::parse(
            "global_question_timeout: 20\nquestions:\n  - name: q\n    text: t\n    question_timeout: 0\n    options:\n      - option_text: a\n        reply_text: b\n",
        )
        .unwrap();
        assert_eq!(questions[0].timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_mistyped_timeout_rejects_entry() {
        let result = QuestionCatalog::parse(
            "questions:\n  - name: q\n    text: t\n    question_timeout: soon\n    options:\n      - option_text: a\n        reply_text: b\n",
        );
        assert!(matches!(result, Err(CatalogLoadError::NoValidQuestions)));
    }

    #[test]
    fn test_missing_text_and_options_are_rejected() {
        let entries = QuestionCatalog::inspect_str(
            "questions:\n  - name: no_text\n    options:\n      - option_text: a\n        reply_text: b\n  - name: no_options\n    text: t\n",
        )
        .unwrap();
        assert!(matches!(entries[0], Err(QuestionError::MissingText { .. })));
        assert!(matches!(entries[1], Err(QuestionError::NoOptions { .. })));
    }

    #[test]
    fn test_numeric_scalars_are_text() {
        let questions = QuestionCatalog::parse(
            "questions:\n  - name: 2024\n    text: \"2 + 2 = ?\"\n    options:\n      - option_text: 4\n        reply_text: \"Correct, {mention}!\"\n      - option_text: 5\n        reply_text: true\n",
        )
        .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].name(), "2024");
        let labels: Vec<_> = questions[0].buttons().map(|(_, label)| label.to_owned()).collect();
        assert_eq!(labels, ["4", "5"]);
        assert_eq!(questions[0].options()[1].reply, "true");
    }

    #[test]
    fn test_collection_text_is_rejected() {
        let entries = QuestionCatalog::inspect_str(
            "questions:\n  - name: [a, b]\n    text: t\n    options:\n      - option_text: a\n        reply_text: b\n  - name: q\n    text: t\n    options:\n      - option_text: {a: 1}\n        reply_text: b\n",
        )
        .unwrap();
        assert!(matches!(entries[0], Err(QuestionError::MissingName)));
        assert!(matches!(entries[1], Err(QuestionError::EmptyOptionLabel { index: 0, .. })));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let questions = QuestionCatalog::parse(
            "extra: 1\nquestions:\n  - name: q\n    text: t\n    color: red\n    options:\n      - option_text: a\n        reply_text: b\n        emoji: x\n",
        )
        .unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn test_top_level_not_mapping() {
        assert!(matches!(
            QuestionCatalog::parse("- a\n- b\n"),
            Err(CatalogLoadError::NotAMapping)
        ));
        assert!(matches!(QuestionCatalog::parse(""), Err(CatalogLoadError::NotAMapping)));
    }

    #[test]
    fn test_questions_not_list() {
        assert!(matches!(
            QuestionCatalog::parse("questions: nope\n"),
            Err(CatalogLoadError::QuestionsNotAList)
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            QuestionCatalog::parse("questions: [unclosed\n"),
            Err(CatalogLoadError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_source_uses_fallback() {
        let catalog = QuestionCatalog::open("/nonexistent/greeting_questions.yaml");
        let questions = catalog.snapshot().await;
        assert_eq!(questions.as_slice(), &[Question::fallback()]);
        assert_eq!(catalog.random_question().await, Question::fallback());
    }

    #[tokio::test]
    async fn test_empty_source_uses_fallback() {
        let path = temp_file("empty", "questions: []\n");
        let catalog = QuestionCatalog::open(&path);
        assert_eq!(catalog.snapshot().await.as_slice(), &[Question::fallback()]);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_reload_keeps_previous_set_on_failure() {
        let path = temp_file("reload", THREE_ENTRIES_ONE_BROKEN);
        let catalog = QuestionCatalog::open(&path);
        assert_eq!(catalog.len().await, 2);

        std::fs::write(&path, "questions: 5\n").unwrap();
        assert!(catalog.reload().await.is_err());
        assert_eq!(catalog.len().await, 2);

        std::fs::write(
            &path,
            "questions:\n  - name: q\n    text: t\n    options:\n      - option_text: a\n        reply_text: b\n",
        )
        .unwrap();
        assert_eq!(catalog.reload().await.unwrap(), 1);
        assert_eq!(catalog.random_question().await.name(), "q");

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_random_question_comes_from_loaded_set() {
        let questions = QuestionCatalog::parse(THREE_ENTRIES_ONE_BROKEN).unwrap();
        let catalog = QuestionCatalog::from_questions("unused.yaml", questions.clone());
        for _ in 0..20 {
            let picked = catalog.random_question().await;
            assert!(questions.contains(&picked));
        }
    }
}
