// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat commands: `/start`, `/help`, `/subscribe`, `/unsubscribe`,
//! `/settings`, `/list`.
//!
//! Replies and user-facing errors go out through the `messages` queue.
//! Pipeline errors propagate to the handler base and are never shown in chat.

pub mod parser;

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;
use tracing::{debug, info};

use octorelay_core::queues;
use octorelay_core::types::{ChatId, NewSubscription, Subscription, TrackedKind};
use octorelay_core::{ChatError, RelayError};
use octorelay_queue::events::{ChatCommand, OutgoingMessage};
use octorelay_queue::{EventHandler, Outcome};
use octorelay_telegram::markdown::{bold, code, escape};

use crate::context::RelayContext;
use parser::ParsedCommand;

const SECRET_LEN: usize = 32;

const HELP: &str = "I forward GitHub notifications to this chat.

/subscribe owner/repo [--secret=...] - start receiving events
/unsubscribe owner/repo - stop receiving events
/settings owner/repo - show notification switches
/list - show this chat's subscriptions
/help - show this message";

/// Failures explained to the user in the chat.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command /{0}, see /help")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{0} is not a repository, expected owner/name")]
    InvalidRepository(String),

    #[error("only chat administrators can use /{0} here")]
    NotAdmin(String),

    #[error("this chat is not subscribed to {0}")]
    NotSubscribed(String),

    #[error("this chat has no subscriptions yet, try /subscribe owner/name")]
    NoSubscriptions,
}

/// Either a user mistake (replied to) or a relay failure (propagated).
enum Failure {
    User(CommandError),
    Relay(RelayError),
}

impl From<CommandError> for Failure {
    fn from(e: CommandError) -> Self {
        Failure::User(e)
    }
}

impl From<RelayError> for Failure {
    fn from(e: RelayError) -> Self {
        Failure::Relay(e)
    }
}

impl From<ChatError> for Failure {
    fn from(e: ChatError) -> Self {
        Failure::Relay(e.into())
    }
}

/// Validates and normalises `owner/name`.
pub fn parse_repository(raw: &str) -> Result<String, CommandError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match raw.split_once('/') {
        Some((owner, name)) if valid_part(owner) && valid_part(name) => {
            Ok(raw.to_ascii_lowercase())
        }
        _ => Err(CommandError::InvalidRepository(raw.to_string())),
    }
}

pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Consumer of the chat command queue.
pub struct CommandHandler {
    ctx: RelayContext,
}

impl CommandHandler {
    pub fn new(ctx: RelayContext) -> Self {
        Self { ctx }
    }

    async fn reply(&self, chat_id: ChatId, text: String) -> Result<(), RelayError> {
        self.ctx
            .queue
            .publish(queues::MESSAGES, &OutgoingMessage { chat_id, text })
            .await
    }

    async fn require_admin(&self, command: &ChatCommand, name: &str) -> Result<(), Failure> {
        if command.private {
            return Ok(());
        }
        let admins = self.ctx.chat.get_chat_administrators(command.chat_id).await?;
        if admins.iter().any(|m| m.user_id == command.user_id && m.privileged) {
            Ok(())
        } else {
            Err(CommandError::NotAdmin(name.to_string()).into())
        }
    }

    fn repository_arg(parsed: &ParsedCommand, usage: &'static str) -> Result<String, CommandError> {
        match parsed.args.as_slice() {
            [repository] => parse_repository(repository),
            _ => Err(CommandError::Usage(usage)),
        }
    }

    async fn subscription(&self, chat_id: ChatId, repository: &str) -> Result<Subscription, Failure> {
        self.ctx
            .store
            .find_subscription(chat_id, repository)
            .await?
            .ok_or_else(|| CommandError::NotSubscribed(repository.to_string()).into())
    }

    /// Deletes the current settings message, if any, so the next settings
    /// render sends a fresh one.
    async fn discard_settings_message(&self, subscription: &Subscription) -> Result<(), RelayError> {
        let store = &self.ctx.store;
        let Some(object) = store
            .find_tracked(subscription.id, TrackedKind::Settings, &subscription.id.to_string())
            .await?
        else {
            return Ok(());
        };
        let Some(message_id) = store
            .message_identity(object.id)
            .await?
            .and_then(|identity| identity.chat_message_id)
        else {
            return Ok(());
        };
        if let Err(e) = self.ctx.chat.delete_message(subscription.chat_id, message_id).await {
            debug!(error = %e, "old settings message could not be deleted");
        }
        store.delete_message_identity(object.id, Some(message_id)).await?;
        Ok(())
    }

    async fn execute(&self, command: &ChatCommand, parsed: &ParsedCommand) -> Result<String, Failure> {
        match parsed.name.as_str() {
            "start" | "help" => Ok(escape(HELP)),
            "subscribe" => self.subscribe(command, parsed).await,
            "unsubscribe" => self.unsubscribe(command, parsed).await,
            "settings" => self.settings(command, parsed).await,
            "list" => self.list(command).await,
            other => Err(CommandError::Unknown(other.to_string()).into()),
        }
    }

    async fn subscribe(&self, command: &ChatCommand, parsed: &ParsedCommand) -> Result<String, Failure> {
        let repository = Self::repository_arg(parsed, "/subscribe owner/repo [--secret=...]")?;
        self.require_admin(command, "subscribe").await?;

        let secret = parsed
            .option("secret")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_secret);
        let subscription = self
            .ctx
            .store
            .save_subscription(&NewSubscription {
                chat_id: command.chat_id,
                repository_full_name: repository,
                secret,
            })
            .await?;
        info!(
            chat_id = command.chat_id.0,
            subscription_id = subscription.id.0,
            repository = %subscription.repository_full_name,
            "subscription saved"
        );
        self.discard_settings_message(&subscription).await?;
        self.ctx.request_settings_render(&subscription).await?;

        Ok(format!(
            "Subscribed to {}\\.\n\nAdd a webhook in the repository settings:\nPayload URL: {}\nContent type: {}\nSecret: {}\nEvents: {}",
            bold(&subscription.repository_full_name),
            code(&self.ctx.settings.webhook_url()),
            code("application/json"),
            code(&subscription.secret),
            escape("issues, pull requests, check suites, pushes"),
        ))
    }

    async fn unsubscribe(&self, command: &ChatCommand, parsed: &ParsedCommand) -> Result<String, Failure> {
        let repository = Self::repository_arg(parsed, "/unsubscribe owner/repo")?;
        self.require_admin(command, "unsubscribe").await?;
        let subscription = self.subscription(command.chat_id, &repository).await?;

        self.discard_settings_message(&subscription).await?;
        self.ctx.store.delete_subscription(subscription.id).await?;
        info!(
            chat_id = command.chat_id.0,
            subscription_id = subscription.id.0,
            "subscription removed"
        );
        Ok(format!("Unsubscribed from {}\\.", bold(&repository)))
    }

    async fn settings(&self, command: &ChatCommand, parsed: &ParsedCommand) -> Result<String, Failure> {
        let repository = Self::repository_arg(parsed, "/settings owner/repo")?;
        self.require_admin(command, "settings").await?;
        let subscription = self.subscription(command.chat_id, &repository).await?;
        self.discard_settings_message(&subscription).await?;
        self.ctx.request_settings_render(&subscription).await?;
        Ok(format!("Settings for {} are on the way\\.", bold(&repository)))
    }

    async fn list(&self, command: &ChatCommand) -> Result<String, Failure> {
        let subscriptions = self.ctx.store.subscriptions_for_chat(command.chat_id).await?;
        if subscriptions.is_empty() {
            return Err(CommandError::NoSubscriptions.into());
        }
        let lines: Vec<String> = subscriptions
            .iter()
            .map(|s| format!("\\- {}", code(&s.repository_full_name)))
            .collect();
        Ok(format!("Subscriptions:\n{}", lines.join("\n")))
    }
}

#[async_trait]
impl EventHandler for CommandHandler {
    type Event = ChatCommand;

    fn name(&self) -> &str {
        "chat-command"
    }

    async fn handle(&self, command: ChatCommand) -> Result<Outcome, RelayError> {
        let Some(parsed) = parser::parse(&command.text) else {
            return Ok(Outcome::skip("not a command"));
        };
        let reply = match self.execute(&command, &parsed).await {
            Ok(reply) => reply,
            Err(Failure::User(e)) => {
                debug!(chat_id = command.chat_id.0, command = %parsed.name, error = %e, "command refused");
                format!("⚠️ {}", escape(&e.to_string()))
            }
            Err(Failure::Relay(e)) => return Err(e),
        };
        self.reply(command.chat_id, reply).await?;
        Ok(Outcome::Done)
    }
}
