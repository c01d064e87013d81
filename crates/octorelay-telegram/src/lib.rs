// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram Bot API adapter for Octorelay.
//!
//! [`TelegramChat`] implements [`ChatApi`] with teloxide, sending every
//! message as MarkdownV2. [`updates`] runs long polling and turns incoming
//! commands and keyboard taps into queue events.

pub mod errors;
pub mod keyboard;
pub mod markdown;
pub mod updates;

use async_trait::async_trait;
use octorelay_config::model::TelegramConfig;
use octorelay_core::types::{ChatId, ChatMember, ChatMessageId, InlineKeyboard};
use octorelay_core::{ChatApi, ChatError, RelayError};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, UserId};
use tracing::debug;

use crate::errors::classify;
use crate::keyboard::to_markup;

/// Outbound chat client backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    /// Creates a client from `[telegram]` config; `bot_token` is required.
    pub fn new(config: &TelegramConfig) -> Result<Self, RelayError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RelayError::Config("telegram.bot_token is required to reach Telegram".into())
        })?;
        if token.trim().is_empty() {
            return Err(RelayError::Config("telegram.bot_token cannot be empty".into()));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

fn tg_message(message_id: ChatMessageId) -> MessageId {
    MessageId(message_id.0)
}

fn to_member(member: &teloxide::types::ChatMember) -> ChatMember {
    ChatMember {
        user_id: member.user.id.0 as i64,
        privileged: member.is_privileged(),
    }
}

#[async_trait]
impl ChatApi for TelegramChat {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<ChatMessageId, ChatError> {
        let mut request = self
            .bot
            .send_message(tg_chat(chat_id), text)
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        let sent = request.await.map_err(|e| classify("sendMessage", e))?;
        debug!(chat_id = chat_id.0, message_id = sent.id.0, "message sent");
        Ok(ChatMessageId(sent.id.0))
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChatError> {
        let mut request = self
            .bot
            .edit_message_text(tg_chat(chat_id), tg_message(message_id), text)
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        request
            .await
            .map_err(|e| classify("editMessageText", e))?;
        Ok(())
    }

    async fn edit_message_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChatError> {
        let mut request = self
            .bot
            .edit_message_reply_markup(tg_chat(chat_id), tg_message(message_id));
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard));
        }
        request
            .await
            .map_err(|e| classify("editMessageReplyMarkup", e))?;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
    ) -> Result<(), ChatError> {
        self.bot
            .delete_message(tg_chat(chat_id), tg_message(message_id))
            .await
            .map_err(|e| classify("deleteMessage", e))?;
        Ok(())
    }

    async fn get_chat_administrators(&self, chat_id: ChatId) -> Result<Vec<ChatMember>, ChatError> {
        let admins = self
            .bot
            .get_chat_administrators(tg_chat(chat_id))
            .await
            .map_err(|e| classify("getChatAdministrators", e))?;
        Ok(admins.iter().map(to_member).collect())
    }

    async fn get_chat_member(&self, chat_id: ChatId, user_id: i64) -> Result<ChatMember, ChatError> {
        let member = self
            .bot
            .get_chat_member(tg_chat(chat_id), UserId(user_id as u64))
            .await
            .map_err(|e| classify("getChatMember", e))?;
        Ok(to_member(&member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_token() {
        let err = TelegramChat::new(&config(None)).err().expect("missing token");
        assert!(err.to_string().contains("bot_token is required"));
    }

    #[test]
    fn new_rejects_blank_token() {
        let err = TelegramChat::new(&config(Some("  "))).err().expect("blank token");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn new_accepts_token() {
        assert!(TelegramChat::new(&config(Some("123456:ABC-DEF"))).is_ok());
    }

    #[test]
    fn ids_convert_both_ways() {
        assert_eq!(tg_chat(ChatId(-100123)).0, -100123);
        assert_eq!(tg_message(ChatMessageId(42)).0, 42);
    }
}
