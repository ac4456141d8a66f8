//! In-memory registry of newcomers awaiting verification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use tracing::{debug, warn};

use super::{ChatUser, MessageRef, Question, UserId};

/// Registry lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("User {0} already awaits verification")]
    AlreadyPending(UserId),

    #[error("User {0} does not await verification")]
    NotPending(UserId),
}

/// A newcomer who has not answered yet.
///
/// Values are never mutated in place; attaching the prompt produces a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdmission {
    seq: u64,
    user: ChatUser,
    question: Question,
    timeout: Duration,
    joined_at: DateTime<Utc>,
    prompt: Option<MessageRef>,
}

impl PendingAdmission {
    /// Unique number of this admission, distinct across re-joins.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub const fn user(&self) -> &ChatUser {
        &self.user
    }

    #[must_use]
    pub const fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// The delivered prompt, once attached.
    #[must_use]
    pub const fn prompt(&self) -> Option<MessageRef> {
        self.prompt
    }

    /// Moment the newcomer times out.
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|timeout| self.joined_at.checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Time left before `deadline`, zero once passed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline() - now).to_std().unwrap_or(Duration::ZERO)
    }

    fn with_prompt(&self, prompt: MessageRef) -> Self {
        Self {
            prompt: Some(prompt),
            ..self.clone()
        }
    }
}

/// Pending admissions keyed by user, at most one per user.
#[derive(Debug, Default)]
pub struct NewbieRegistry {
    entries: DashMap<UserId, PendingAdmission>,
    next_seq: AtomicU64,
}

impl NewbieRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newcomer; fails if one is already pending for this user.
    pub fn add(
        &self,
        user: ChatUser,
        timeout: Duration,
        question: Question,
    ) -> Result<PendingAdmission, RegistryError> {
        debug!("Trying to add user {} into newbie list", user);

        match self.entries.entry(user.id) {
            Entry::Occupied(_) => {
                warn!("Can not add! User {} already in newbie list", user);
                Err(RegistryError::AlreadyPending(user.id))
            }
            Entry::Vacant(slot) => {
                let admission = PendingAdmission {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    user,
                    question,
                    timeout,
                    joined_at: Utc::now(),
                    prompt: None,
                };
                slot.insert(admission.clone());
                Ok(admission)
            }
        }
    }

    /// Removes a newcomer. Absence is a logged no-op.
    ///
    /// Returns the removed admission; of several concurrent callers only one
    /// gets `Some`.
    pub fn remove(&self, user: UserId) -> Option<PendingAdmission> {
        debug!("Trying to remove newbie {} from list", user);
        let removed = self.entries.remove(&user).map(|(_, admission)| admission);
        if removed.is_none() {
            warn!("Can not remove! User {} not found in newbie list", user);
        }
        removed
    }

    /// Removes the admission numbered `seq`, leaving a newer one for the same
    /// user untouched.
    pub fn remove_admission(&self, user: UserId, seq: u64) -> Option<PendingAdmission> {
        let removed = self
            .entries
            .remove_if(&user, |_, admission| admission.seq == seq)
            .map(|(_, admission)| admission);
        if removed.is_none() {
            debug!("Admission #{} of user {} already resolved", seq, user);
        }
        removed
    }

    /// Records the delivered prompt message.
    pub fn attach_prompt(&self, user: UserId, prompt: MessageRef) -> Result<(), RegistryError> {
        debug!("Trying to attach prompt {:?} for newbie {}", prompt, user);
        let Some(mut entry) = self.entries.get_mut(&user) else {
            return Err(RegistryError::NotPending(user));
        };
        let updated = entry.with_prompt(prompt);
        *entry = updated;
        Ok(())
    }

    /// Current admission of `user`.
    pub fn get(&self, user: UserId) -> Result<PendingAdmission, RegistryError> {
        self.entries
            .get(&user)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::NotPending(user))
    }

    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.entries.contains_key(&user)
    }

    /// Snapshot of pending user ids, in no particular order.
    #[must_use]
    pub fn list_users(&self) -> Vec<UserId> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    /// Iterates over a snapshot of pending admissions.
    pub fn iter(&self) -> std::vec::IntoIter<PendingAdmission> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
