// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event payloads exchanged between the ingress, the Telegram poller, and
//! the pipeline handlers.

use serde::{Deserialize, Serialize};

use octorelay_core::types::{ChatId, ChatMessageId, TrackedObjectId};

use crate::envelope::Event;

/// One GitHub webhook delivery, published by the HTTP ingress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubWebhook {
    /// Value of `X-GitHub-Event`.
    pub event: String,
    /// Value of `X-Hub-Signature` (`sha1=<hex>`).
    pub signature: String,
    /// Raw request body, byte-for-byte as signed.
    pub body: String,
}

impl Event for GithubWebhook {
    const KIND: &'static str = "github_webhook";
}

/// Asks a render handler to bring a tracked object's chat message up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub tracked_object_id: TrackedObjectId,
}

impl Event for RenderRequest {
    const KIND: &'static str = "render";
}

/// A `/command` message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCommand {
    pub chat_id: ChatId,
    pub user_id: i64,
    /// Private (one-to-one) chat with the bot.
    pub private: bool,
    pub text: String,
}

impl Event for ChatCommand {
    const KIND: &'static str = "chat_command";
}

/// An inline keyboard tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub chat_id: ChatId,
    pub message_id: ChatMessageId,
    pub user_id: i64,
    pub private: bool,
    /// Dot-separated callback token, e.g. `webhook.42.refresh`.
    pub data: String,
}

impl Event for CallbackQuery {
    const KIND: &'static str = "callback_query";
}

/// A plain message to send, already formatted as MarkdownV2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

impl Event for OutgoingMessage {
    const KIND: &'static str = "outgoing_message";
}
