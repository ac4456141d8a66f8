//! Command handler implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::duration::format_duration;
use super::types::{CommandResult, ModerationCommand};
use crate::greeting::{ChatId, ChatUser, NewbieRegistry, QuestionCatalog};
use crate::notification::{NotificationService, TemplateFieldError};
use crate::platform::{ChatPlatform, Sanction};

/// Executes moderation commands posted in the chat.
pub struct CommandHandler<P> {
    platform: Arc<P>,
    notifications: Arc<NotificationService>,
    registry: Arc<NewbieRegistry>,
    catalog: Arc<QuestionCatalog>,

    /// Restriction length when the command gives none.
    default_restrict: Duration,

    /// Read-only time for members using admin commands without rights.
    punishment: Duration,
}

impl<P: ChatPlatform> CommandHandler<P> {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        platform: Arc<P>,
        notifications: Arc<NotificationService>,
        registry: Arc<NewbieRegistry>,
        catalog: Arc<QuestionCatalog>,
        default_restrict: Duration,
        punishment: Duration,
    ) -> Self {
        Self {
            platform,
            notifications,
            registry,
            catalog,
            default_restrict,
            punishment,
        }
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(
        &self,
        chat: ChatId,
        from: &ChatUser,
        reply_to: Option<&ChatUser>,
        text: &str,
    ) -> Option<CommandResult> {
        let command = ModerationCommand::parse(text)?;

        debug!("Handling command {} from {}", command, from);
        let result = self.execute(chat, from, reply_to, command).await;
        info!("Command result: success={}", result.success);

        Some(result)
    }

    async fn execute(
        &self,
        chat: ChatId,
        from: &ChatUser,
        reply_to: Option<&ChatUser>,
        command: ModerationCommand,
    ) -> CommandResult {
        if command.requires_admin() {
            match self.platform.is_admin(chat, from.id).await {
                Ok(true) => {}
                Ok(false) => return self.punish(chat, from).await,
                Err(e) => {
                    warn!("Admin check for {} failed: {}", from, e);
                    return CommandResult::error("Could not verify admin rights, try again later.");
                }
            }
        }

        let target = if command.needs_target() {
            match reply_to {
                Some(target) => Some(target),
                None => {
                    return CommandResult::error(
                        "Reply to a message of the member this command is for.",
                    );
                }
            }
        } else {
            None
        };

        match (command, target) {
            (ModerationCommand::ReadOnly(duration), Some(target)) => {
                let duration = duration.unwrap_or(self.default_restrict);
                let text = self
                    .notifications
                    .read_only(&target.first_name, &format_duration(duration));
                self.sanction(chat, target, Sanction::ReadOnly(duration), text).await
            }
            (ModerationCommand::TextOnly(duration), Some(target)) => {
                let duration = duration.unwrap_or(self.default_restrict);
                let text = self
                    .notifications
                    .text_only(&target.first_name, &format_duration(duration));
                self.sanction(chat, target, Sanction::TextOnly(duration), text).await
            }
            (ModerationCommand::Ban(duration), Some(target)) => {
                let duration = duration.unwrap_or(self.default_restrict);
                let text = self
                    .notifications
                    .ban_kick(&target.first_name, &format_duration(duration));
                self.sanction(chat, target, Sanction::Ban(duration), text).await
            }
            (ModerationCommand::ReadWrite, Some(target)) => {
                let text = self.notifications.read_write(&target.first_name);
                self.sanction(chat, target, Sanction::ReadWrite, text).await
            }
            (ModerationCommand::Pending, _) => self.handle_pending(),
            (ModerationCommand::Reload, _) => self.handle_reload().await,
            (ModerationCommand::Help, _) => Self::handle_help(),
            (command, None) => {
                error!("Command {} reached execution without a target", command);
                CommandResult::error("This command needs a target member.")
            }
        }
    }

    /// Applies `sanction` once its notice rendered correctly.
    async fn sanction(
        &self,
        chat: ChatId,
        target: &ChatUser,
        sanction: Sanction,
        text: Result<String, TemplateFieldError>,
    ) -> CommandResult {
        let Ok(text) = text else {
            return CommandResult::error("Notification templates are misconfigured.");
        };

        match self.platform.apply_sanction(chat, target.id, sanction).await {
            Ok(()) => {
                info!("Applied {:?} to {}", sanction, target);
                CommandResult::success(text)
            }
            Err(e) => {
                warn!("Failed to apply {:?} to {}: {}", sanction, target, e);
                CommandResult::error(format!("Failed to restrict {}: {e}", target.first_name))
            }
        }
    }

    async fn punish(&self, chat: ChatId, offender: &ChatUser) -> CommandResult {
        warn!("Unauthorized moderation attempt by {}", offender);

        let Ok(text) = self.notifications.unauthorized_punishment(&offender.first_name) else {
            return CommandResult::error("Notification templates are misconfigured.");
        };

        if let Err(e) = self
            .platform
            .apply_sanction(chat, offender.id, Sanction::ReadOnly(self.punishment))
            .await
        {
            warn!("Failed to punish {}: {}", offender, e);
            return CommandResult::error("Only admins can use this command.");
        }

        CommandResult::error(text)
    }

    fn handle_pending(&self) -> CommandResult {
        let mut pending: Vec<_> = self.registry.iter().collect();
        if pending.is_empty() {
            return CommandResult::success("No newcomers awaiting verification.");
        }

        pending.sort_by_key(|admission| admission.joined_at());
        let now = Utc::now();

        let mut lines = vec![format!("Awaiting verification ({}):", pending.len())];
        for admission in &pending {
            lines.push(format!(
                "  {} - {}s left",
                admission.user().mention(),
                admission.remaining(now).as_secs()
            ));
        }

        CommandResult::success(lines.join("\n"))
    }

    async fn handle_reload(&self) -> CommandResult {
        match self.catalog.reload().await {
            Ok(count) => CommandResult::success(format!("✓ Reloaded {count} greeting questions")),
            Err(e) => CommandResult::error(format!("Reload failed, keeping current questions: {e}")),
        }
    }

    fn handle_help() -> CommandResult {
        let mut lines = vec!["Available commands:".to_owned()];
        for (usage, description) in ModerationCommand::all_commands() {
            lines.push(format!("  {usage} - {description}"));
        }
        CommandResult::success(lines.join("\n"))
    }
}

impl<P> std::fmt::Debug for CommandHandler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("default_restrict", &self.default_restrict)
            .field("punishment", &self.punishment)
            .finish_non_exhaustive()
    }
}
