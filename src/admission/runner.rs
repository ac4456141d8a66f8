//! Event dispatch loop.
//!
//! Events are handled one at a time in arrival order. Timeouts run on their
//! own tasks and meet the loop only through the registry.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{AdmissionController, AdmissionError};
use crate::commands::CommandHandler;
use crate::greeting::RegistryError;
use crate::platform::{ChatEvent, ChatPlatform};

/// Routes platform events to the admission flow and the command handler.
pub struct EventRunner<P> {
    controller: AdmissionController<P>,
    commands: CommandHandler<P>,
    platform: Arc<P>,
}

impl<P: ChatPlatform> EventRunner<P> {
    #[must_use]
    pub fn new(
        controller: AdmissionController<P>,
        commands: CommandHandler<P>,
        platform: Arc<P>,
    ) -> Self {
        Self {
            controller,
            commands,
            platform,
        }
    }

    /// Runs until the event channel closes.
    pub async fn run(&self, mut rx: mpsc::Receiver<ChatEvent>) {
        info!("Event runner started");
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
        info!("Event runner stopped");
    }

    /// Handles a single event.
    pub async fn handle(&self, event: ChatEvent) {
        match event {
            ChatEvent::Joined { chat, user } => match self.controller.on_join(chat, user).await {
                Ok(admission) => debug!("Admission #{} started", admission.seq()),
                Err(AdmissionError::Registry(RegistryError::AlreadyPending(user))) => {
                    info!("Ignoring repeated join of {}", user);
                }
                Err(e) => error!("Failed to greet newcomer: {}", e),
            },
            ChatEvent::Answered { chat, user, key } => {
                match self.controller.on_answer(chat, user.id, &key).await {
                    Ok(_) => {}
                    Err(AdmissionError::Registry(RegistryError::NotPending(_))) => {
                        debug!("Answer from {} ignored, nothing pending", user);
                    }
                    Err(e @ AdmissionError::InvalidOption { .. }) => warn!("{}", e),
                    Err(e) => error!("Failed to process answer of {}: {}", user, e),
                }
            }
            ChatEvent::Message {
                chat,
                from,
                reply_to,
                text,
            } => {
                let Some(result) = self
                    .commands
                    .try_handle(chat, &from, reply_to.as_ref(), &text)
                    .await
                else {
                    return;
                };
                if let Err(e) = self.platform.send_text(chat, &result.message).await {
                    warn!("Failed to send command response: {}", e);
                }
            }
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &AdmissionController<P> {
        &self.controller
    }
}

impl<P> std::fmt::Debug for EventRunner<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRunner")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::NotificationTemplates;
    use crate::greeting::{ChatId, ChatUser, NewbieRegistry, QuestionCatalog, UserId};
    use crate::notification::NotificationService;
    use crate::platform::testing::RecordingPlatform;

    const CHAT: ChatId = ChatId(-5);

    fn runner() -> (EventRunner<RecordingPlatform>, Arc<RecordingPlatform>) {
        let platform = Arc::new(RecordingPlatform::with_admins([UserId(1)]));
        let registry = Arc::new(NewbieRegistry::new());
        let catalog = Arc::new(QuestionCatalog::from_questions("unused.yaml", Vec::new()));
        let notifications = Arc::new(NotificationService::new(&NotificationTemplates::example()));

        let controller = AdmissionController::new(
            Arc::clone(&registry),
            Arc::clone(&catalog),
            Arc::clone(&notifications),
            Arc::clone(&platform),
        );
        let commands = CommandHandler::new(
            Arc::clone(&platform),
            notifications,
            registry,
            catalog,
            Duration::from_secs(600),
            Duration::from_secs(60),
        );
        (EventRunner::new(controller, commands, Arc::clone(&platform)), platform)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_processes_events_in_order() {
        let (runner, platform) = runner();
        let (tx, rx) = mpsc::channel(8);
        let alex = ChatUser::new(7, "Alex");

        tx.send(ChatEvent::Joined { chat: CHAT, user: alex.clone() }).await.unwrap();
        tx.send(ChatEvent::Joined { chat: CHAT, user: alex.clone() }).await.unwrap();
        tx.send(ChatEvent::Answered { chat: CHAT, user: alex.clone(), key: "0".to_owned() })
            .await
            .unwrap();
        tx.send(ChatEvent::Answered { chat: CHAT, user: alex, key: "0".to_owned() })
            .await
            .unwrap();
        drop(tx);

        runner.run(rx).await;

        assert!(runner.controller().registry().is_empty());
        assert_eq!(platform.questions(), 1);
        assert_eq!(platform.texts(), vec!["Welcome, Alex!".to_owned()]);
    }

    #[tokio::test]
    async fn test_command_response_is_posted() {
        let (runner, platform) = runner();
        runner
            .handle(ChatEvent::Message {
                chat: CHAT,
                from: ChatUser::new(1, "Admin"),
                reply_to: Some(ChatUser::new(7, "Alex")),
                text: "/ro".to_owned(),
            })
            .await;

        let texts = platform.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_plain_message_is_ignored() {
        let (runner, platform) = runner();
        runner
            .handle(ChatEvent::Message {
                chat: CHAT,
                from: ChatUser::new(7, "Alex"),
                reply_to: None,
                text: "hi all".to_owned(),
            })
            .await;
        assert!(platform.actions().is_empty());
    }
}
