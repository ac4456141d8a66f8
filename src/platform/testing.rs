//! Recording platform for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::time::Duration;

use super::{ChatPlatform, PlatformError, Sanction};
use crate::greeting::{ChatId, MessageRef, UserId};

/// Outgoing action captured by [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Question {
        chat: ChatId,
        text: String,
        buttons: Vec<(String, String)>,
    },
    Text {
        chat: ChatId,
        text: String,
    },
    Deleted(MessageRef),
    Kicked {
        chat: ChatId,
        user: UserId,
    },
    Sanctioned {
        chat: ChatId,
        user: UserId,
        sanction: Sanction,
    },
}

#[derive(Debug, Default)]
pub struct RecordingPlatform {
    actions: Mutex<Vec<Action>>,
    admins: HashSet<UserId>,
    next_message_id: AtomicI32,
    fail_sends: AtomicBool,
    question_delay_ms: AtomicU64,
    reject_sanctions: AtomicBool,
}

impl RecordingPlatform {
    pub fn with_admins(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn reject_sanctions(&self, reject: bool) {
        self.reject_sanctions.store(reject, Ordering::SeqCst);
    }

    /// Makes `send_question` take `delay` before it is delivered.
    pub fn delay_questions(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.question_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn questions(&self) -> usize {
        self.actions()
            .iter()
            .filter(|action| matches!(action, Action::Question { .. }))
            .count()
    }

    fn record(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }

    fn message(&self, chat: ChatId) -> Result<MessageRef, PlatformError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Connection("offline".to_owned()));
        }
        Ok(MessageRef::new(
            chat,
            self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
        ))
    }
}

impl ChatPlatform for RecordingPlatform {
    async fn send_question(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<MessageRef, PlatformError> {
        let delay = self.question_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let message = self.message(chat)?;
        self.record(Action::Question {
            chat,
            text: text.to_owned(),
            buttons: buttons.to_vec(),
        });
        Ok(message)
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, PlatformError> {
        let message = self.message(chat)?;
        self.record(Action::Text {
            chat,
            text: text.to_owned(),
        });
        Ok(message)
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), PlatformError> {
        self.record(Action::Deleted(message));
        Ok(())
    }

    async fn kick(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.record(Action::Kicked { chat, user });
        Ok(())
    }

    async fn apply_sanction(
        &self,
        chat: ChatId,
        user: UserId,
        sanction: Sanction,
    ) -> Result<(), PlatformError> {
        if self.reject_sanctions.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected("not enough rights".to_owned()));
        }
        self.record(Action::Sanctioned {
            chat,
            user,
            sanction,
        });
        Ok(())
    }

    async fn is_admin(&self, _chat: ChatId, user: UserId) -> Result<bool, PlatformError> {
        Ok(self.admins.contains(&user))
    }
}
