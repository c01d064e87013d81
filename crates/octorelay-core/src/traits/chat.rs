// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound chat API port (Telegram Bot API in production).

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{ChatId, ChatMember, ChatMessageId, InlineKeyboard};

/// The subset of the chat API the relay needs.
///
/// Implementations must classify failures into [`ChatError`] variants; the
/// render state machine depends on telling "not modified" and "not found"
/// apart from everything else.
#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    /// Sends a new message and returns its identifier.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<ChatMessageId, ChatError>;

    /// Replaces the text (and keyboard) of an existing message.
    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChatError>;

    /// Replaces only the inline keyboard of an existing message.
    async fn edit_message_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChatError>;

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: ChatMessageId,
    ) -> Result<(), ChatError>;

    async fn get_chat_administrators(&self, chat_id: ChatId) -> Result<Vec<ChatMember>, ChatError>;

    async fn get_chat_member(&self, chat_id: ChatId, user_id: i64) -> Result<ChatMember, ChatError>;
}
