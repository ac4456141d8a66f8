//! Line-oriented platform driven from a terminal.
//!
//! Input lines:
//!
//! ```text
//! join <user_id> <first_name> [username]
//! answer <user_id> <key>
//! say <user_id> [@<reply_to_user_id>] <text>
//! ```
//!
//! Outgoing actions are printed to stdout.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicI32, Ordering};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ChatEvent, ChatPlatform, PlatformError, Sanction};
use crate::greeting::{ChatId, ChatUser, MessageRef, UserId};

/// Terminal stand-in for a real chat network.
#[derive(Debug)]
pub struct ConsolePlatform {
    chat: ChatId,
    admins: HashSet<UserId>,
    next_message_id: AtomicI32,
    users: Mutex<HashMap<UserId, ChatUser>>,
    /// Messages sent and not yet deleted.
    sent: Mutex<HashSet<MessageRef>>,
}

impl ConsolePlatform {
    #[must_use]
    pub fn new(chat: ChatId, admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            chat,
            admins: admins.into_iter().collect(),
            next_message_id: AtomicI32::new(1),
            users: Mutex::new(HashMap::new()),
            sent: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub const fn chat(&self) -> ChatId {
        self.chat
    }

    /// Reads events from `input` until it ends or the receiver is dropped.
    pub async fn read_events<R>(&self, input: R, tx: mpsc::Sender<ChatEvent>)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read console input: {}", e);
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match self.parse_line(&line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => println!("? {e}"),
            }
        }
        debug!("Console input closed");
    }

    /// Parses one input line into an event.
    pub fn parse_line(&self, line: &str) -> Result<ChatEvent, String> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();

        match cmd.to_lowercase().as_str() {
            "join" => {
                let mut parts = rest.split_whitespace();
                let id = parse_user_id(parts.next())?;
                let first_name = parts.next().ok_or("usage: join <id> <first_name> [username]")?;
                let mut user = ChatUser::new(id.0, first_name);
                if let Some(username) = parts.next() {
                    user = user.with_username(username.trim_start_matches('@'));
                }
                self.remember(user.clone());
                Ok(ChatEvent::Joined {
                    chat: self.chat,
                    user,
                })
            }
            "answer" => {
                let mut parts = rest.split_whitespace();
                let id = parse_user_id(parts.next())?;
                let key = parts.next().ok_or("usage: answer <id> <key>")?;
                Ok(ChatEvent::Answered {
                    chat: self.chat,
                    user: self.user(id),
                    key: key.to_owned(),
                })
            }
            "say" => {
                let (id, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("usage: say <id> [@<reply_to_id>] <text>")?;
                let from = self.user(parse_user_id(Some(id))?);
                let text = text.trim_start();

                let (reply_to, text) = match text.split_once(char::is_whitespace) {
                    Some((target, body)) if target.starts_with('@') => {
                        let target = parse_user_id(Some(&target[1..]))?;
                        (Some(self.user(target)), body.trim_start())
                    }
                    _ => (None, text),
                };

                Ok(ChatEvent::Message {
                    chat: self.chat,
                    from,
                    reply_to,
                    text: text.to_owned(),
                })
            }
            other => Err(format!("unknown input '{other}' (join, answer, say)")),
        }
    }

    fn remember(&self, user: ChatUser) {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id, user);
    }

    fn user(&self, id: UserId) -> ChatUser {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ChatUser::new(id.0, format!("user{id}")))
    }

    fn next_message(&self, chat: ChatId) -> MessageRef {
        let message = MessageRef::new(chat, self.next_message_id.fetch_add(1, Ordering::Relaxed));
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message);
        message
    }

    /// Admins cannot be kicked or restricted.
    fn ensure_not_admin(&self, user: UserId) -> Result<(), PlatformError> {
        if self.admins.contains(&user) {
            return Err(PlatformError::Rejected(format!("user {user} is a chat admin")));
        }
        Ok(())
    }
}

/// Writes one line of platform output.
fn output(line: &str) -> Result<(), PlatformError> {
    writeln!(std::io::stdout().lock(), "{line}")
        .map_err(|e| PlatformError::Connection(format!("console output closed: {e}")))
}

fn parse_user_id(token: Option<&str>) -> Result<UserId, String> {
    let token = token.ok_or("missing user id")?;
    token
        .parse()
        .map(UserId)
        .map_err(|_| format!("invalid user id '{token}'"))
}

impl ChatPlatform for ConsolePlatform {
    async fn send_question(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<MessageRef, PlatformError> {
        let message = self.next_message(chat);
        let buttons: Vec<String> = buttons
            .iter()
            .map(|(key, label)| format!("[{key}: {label}]"))
            .collect();
        output(&format!("[{chat}] #{} {text}  {}", message.message_id, buttons.join(" ")))?;
        Ok(message)
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, PlatformError> {
        let message = self.next_message(chat);
        output(&format!("[{chat}] #{} {text}", message.message_id))?;
        Ok(message)
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), PlatformError> {
        let known = self
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&message);
        if !known {
            return Err(PlatformError::MessageNotFound(message));
        }
        output(&format!("[{}] (deleted #{})", message.chat_id, message.message_id))?;
        Ok(())
    }

    async fn kick(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.ensure_not_admin(user)?;
        output(&format!("[{chat}] (kicked {user})"))?;
        Ok(())
    }

    async fn apply_sanction(
        &self,
        chat: ChatId,
        user: UserId,
        sanction: Sanction,
    ) -> Result<(), PlatformError> {
        self.ensure_not_admin(user)?;
        output(&format!("[{chat}] ({sanction:?} for {user})"))?;
        Ok(())
    }

    async fn is_admin(&self, _chat: ChatId, user: UserId) -> Result<bool, PlatformError> {
        Ok(self.admins.contains(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> ConsolePlatform {
        ConsolePlatform::new(ChatId(-1), [UserId(1)])
    }

    #[test]
    fn test_parse_join() {
        let event = platform().parse_line("join 42 Alex @alex").unwrap();
        assert_eq!(
            event,
            ChatEvent::Joined {
                chat: ChatId(-1),
                user: ChatUser::new(42, "Alex").with_username("alex"),
            }
        );
    }

    #[test]
    fn test_answer_uses_known_user() {
        let platform = platform();
        platform.parse_line("join 42 Alex").unwrap();
        let event = platform.parse_line("answer 42 1").unwrap();
        assert_eq!(
            event,
            ChatEvent::Answered {
                chat: ChatId(-1),
                user: ChatUser::new(42, "Alex"),
                key: "1".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_say_with_reply() {
        let event = platform().parse_line("say 1 @42 /ro 10m").unwrap();
        let ChatEvent::Message { from, reply_to, text, .. } = event else {
            panic!("expected message event");
        };
        assert_eq!(from.id, UserId(1));
        assert_eq!(reply_to.map(|u| u.id), Some(UserId(42)));
        assert_eq!(text, "/ro 10m");
    }

    #[test]
    fn test_parse_say_without_reply() {
        let event = platform().parse_line("say 7 hello there").unwrap();
        let ChatEvent::Message { reply_to, text, .. } = event else {
            panic!("expected message event");
        };
        assert!(reply_to.is_none());
        assert_eq!(text, "hello there");
    }

    #[test]
    fn test_parse_errors() {
        let platform = platform();
        assert!(platform.parse_line("join abc Alex").is_err());
        assert!(platform.parse_line("answer 5").is_err());
        assert!(platform.parse_line("dance 5").is_err());
    }

    #[tokio::test]
    async fn test_read_events_skips_bad_lines() {
        let platform = platform();
        let (tx, mut rx) = mpsc::channel(8);
        let input: &[u8] = b"join 2 Bob\n\nnonsense\nanswer 2 0\n";

        platform.read_events(input, tx).await;

        assert!(matches!(rx.recv().await, Some(ChatEvent::Joined { .. })));
        assert!(matches!(rx.recv().await, Some(ChatEvent::Answered { .. })));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_message() {
        let platform = platform();
        let message = platform.send_text(ChatId(-1), "hi").await.unwrap();

        platform.delete_message(message).await.unwrap();
        assert!(matches!(
            platform.delete_message(message).await,
            Err(PlatformError::MessageNotFound(m)) if m == message
        ));
    }

    #[tokio::test]
    async fn test_admins_cannot_be_restricted() {
        let platform = platform();
        assert!(matches!(
            platform.kick(ChatId(-1), UserId(1)).await,
            Err(PlatformError::Rejected(_))
        ));
        assert!(matches!(
            platform
                .apply_sanction(ChatId(-1), UserId(1), Sanction::ReadWrite)
                .await,
            Err(PlatformError::Rejected(_))
        ));
        platform.kick(ChatId(-1), UserId(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_check() {
        let platform = platform();
        assert!(platform.is_admin(ChatId(-1), UserId(1)).await.unwrap());
        assert!(!platform.is_admin(ChatId(-1), UserId(2)).await.unwrap());
    }
}
