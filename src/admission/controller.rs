//! Join, answer and timeout handling for newcomers.
//!
//! Flow:
//! 1. On join a random question is drawn, the user is registered as pending
//!    and a deferred timeout task is scheduled.
//! 2. On answer the reply for the chosen option is sent and the admission
//!    is removed, cancelling the timeout.
//! 3. When the timeout fires first, the user is kicked and a timeout notice
//!    is posted.
//!
//! Answer and timeout both finish by removing the admission from the
//! registry. Removal is atomic, so exactly one of them wins; the other sees
//! nothing to remove and stops.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::greeting::{
    ChatId, ChatUser, NewbieRegistry, PendingAdmission, QuestionCatalog, RegistryError, UserId,
};
use crate::notification::{NotificationService, TemplateFieldError};
use crate::platform::{ChatPlatform, PlatformError};

/// Errors of the admission flow.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Unknown answer '{key}' from user {user}")]
    InvalidOption { user: UserId, key: String },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Notification template error: {0}")]
    Template(#[from] TemplateFieldError),
}

/// Drives newcomers through verification.
pub struct AdmissionController<P> {
    registry: Arc<NewbieRegistry>,
    catalog: Arc<QuestionCatalog>,
    notifications: Arc<NotificationService>,
    platform: Arc<P>,
    /// Pending timeout tasks, tagged with the admission they belong to.
    timers: Arc<DashMap<UserId, (u64, AbortHandle)>>,
}

impl<P> Clone for AdmissionController<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            catalog: Arc::clone(&self.catalog),
            notifications: Arc::clone(&self.notifications),
            platform: Arc::clone(&self.platform),
            timers: Arc::clone(&self.timers),
        }
    }
}

impl<P: ChatPlatform> AdmissionController<P> {
    #[must_use]
    pub fn new(
        registry: Arc<NewbieRegistry>,
        catalog: Arc<QuestionCatalog>,
        notifications: Arc<NotificationService>,
        platform: Arc<P>,
    ) -> Self {
        Self {
            registry,
            catalog,
            notifications,
            platform,
            timers: Arc::new(DashMap::new()),
        }
    }

    /// Greets a newcomer with a question and starts their timeout.
    pub async fn on_join(
        &self,
        chat: ChatId,
        user: ChatUser,
    ) -> Result<PendingAdmission, AdmissionError> {
        let question = self.catalog.random_question().await;
        let text = question.render_text(&user);
        let buttons: Vec<(String, String)> = question
            .buttons()
            .map(|(key, label)| (key, label.to_owned()))
            .collect();

        let admission = self.registry.add(user, question.timeout(), question)?;
        let user_id = admission.user().id;
        self.schedule_timeout(chat, &admission);

        match self.platform.send_question(chat, &text, &buttons).await {
            Ok(prompt) => {
                if let Err(e) = self.registry.attach_prompt(user_id, prompt) {
                    // Resolved while the question was in flight.
                    info!("Admission resolved before prompt was attached: {}", e);
                    if let Err(e) = self.platform.delete_message(prompt).await {
                        warn!("Failed to delete greeting {:?}: {}", prompt, e);
                    }
                }
            }
            Err(e) => {
                warn!("Failed to send greeting to {}: {}", admission.user(), e);
                self.registry.remove_admission(user_id, admission.seq());
                self.cancel_timeout(user_id, admission.seq());
                return Err(e.into());
            }
        }

        info!(
            "Newbie {} got question '{}' ({}s to answer)",
            admission.user(),
            admission.question().name(),
            admission.timeout().as_secs()
        );
        Ok(self.registry.get(user_id).unwrap_or(admission))
    }

    /// Handles a button press; returns the reply sent for the chosen option.
    ///
    /// Unknown keys leave the admission pending.
    pub async fn on_answer(
        &self,
        chat: ChatId,
        user: UserId,
        key: &str,
    ) -> Result<String, AdmissionError> {
        let admission = self.registry.get(user)?;
        let reply = admission
            .question()
            .reply_for(key, admission.user())
            .ok_or_else(|| AdmissionError::InvalidOption {
                user,
                key: key.to_owned(),
            })?;

        let admission = self
            .registry
            .remove_admission(user, admission.seq())
            .ok_or(RegistryError::NotPending(user))?;
        self.cancel_timeout(user, admission.seq());

        info!("Newbie {} answered with option {}", admission.user(), key);
        self.delete_prompt(&admission).await;
        self.platform.send_text(chat, &reply).await?;
        Ok(reply)
    }

    /// Expires admission `seq` of `user`.
    ///
    /// Returns `false` when it was already resolved, which is not an error.
    pub async fn expire(&self, chat: ChatId, user: UserId, seq: u64) -> Result<bool, AdmissionError> {
        let Some(admission) = self.registry.remove_admission(user, seq) else {
            return Ok(false);
        };
        self.cancel_timeout(user, seq);

        info!(
            "Newbie {} did not answer within {}s",
            admission.user(),
            admission.timeout().as_secs()
        );
        self.delete_prompt(&admission).await;

        let text = self.notifications.timeout_kick(&admission.user().first_name);
        self.platform.kick(chat, user).await?;
        self.platform.send_text(chat, &text?).await?;
        Ok(true)
    }

    fn schedule_timeout(&self, chat: ChatId, admission: &PendingAdmission) {
        let this = self.clone();
        let user = admission.user().id;
        let seq = admission.seq();
        let timeout = admission.timeout();

        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            this.timers.remove_if(&user, |_, (timer_seq, _)| *timer_seq == seq);
            if let Err(e) = this.expire(chat, user, seq).await {
                warn!("Failed to expire newbie {}: {}", user, e);
            }
        });

        if let Some((old_seq, old)) = self.timers.insert(user, (seq, task.abort_handle())) {
            debug!("Replacing stale timer #{} of user {}", old_seq, user);
            old.abort();
        }
    }

    fn cancel_timeout(&self, user: UserId, seq: u64) {
        if let Some((_, (_, handle))) = self
            .timers
            .remove_if(&user, |_, (timer_seq, _)| *timer_seq == seq)
        {
            handle.abort();
        }
    }

    async fn delete_prompt(&self, admission: &PendingAdmission) {
        if let Some(prompt) = admission.prompt()
            && let Err(e) = self.platform.delete_message(prompt).await
        {
            warn!("Failed to delete greeting {:?}: {}", prompt, e);
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<NewbieRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<QuestionCatalog> {
        &self.catalog
    }

    /// Number of scheduled timeout tasks.
    #[must_use]
    pub fn scheduled_timeouts(&self) -> usize {
        self.timers.len()
    }
}

impl<P> std::fmt::Debug for AdmissionController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("pending", &self.registry.len())
            .field("timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}
