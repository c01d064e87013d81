// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by storage, queue, and pipeline crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::queues;

/// Row identifier of a [`Subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub i64);

/// Row identifier of a [`TrackedObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedObjectId(pub i64);

/// Telegram chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Identifier of a message inside a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessageId(pub i32);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TrackedObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-subscription feature switches, toggled from the settings keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    pub track_pushes: bool,
    pub track_free_ci: bool,
    pub track_pull_request_ci: bool,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            track_pushes: true,
            track_free_ci: true,
            track_pull_request_ci: true,
        }
    }
}

/// Names of the individual switches in [`SubscriptionSettings`].
///
/// The string form is what appears in callback tokens, e.g.
/// `webhook.42.settings.track_pushes.on`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    TrackPushes,
    TrackFreeCi,
    TrackPullRequestCi,
}

impl SettingKey {
    /// Human-readable label used on keyboard buttons.
    pub fn label(self) -> &'static str {
        match self {
            SettingKey::TrackPushes => "Pushes",
            SettingKey::TrackFreeCi => "CI without pull request",
            SettingKey::TrackPullRequestCi => "Pull request CI",
        }
    }
}

impl SubscriptionSettings {
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::TrackPushes => self.track_pushes,
            SettingKey::TrackFreeCi => self.track_free_ci,
            SettingKey::TrackPullRequestCi => self.track_pull_request_ci,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: bool) {
        match key {
            SettingKey::TrackPushes => self.track_pushes = value,
            SettingKey::TrackFreeCi => self.track_free_ci = value,
            SettingKey::TrackPullRequestCi => self.track_pull_request_ci = value,
        }
    }
}

/// A chat's subscription to one GitHub repository.
///
/// `(chat_id, repository_full_name)` is unique. Several chats may subscribe to
/// the same repository, each with an independent webhook secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub chat_id: ChatId,
    pub repository_full_name: String,
    pub secret: String,
    pub settings: SubscriptionSettings,
    pub created_at: String,
}

/// Fields required to create (or re-key) a subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub chat_id: ChatId,
    pub repository_full_name: String,
    pub secret: String,
}

/// The kind of GitHub object a [`TrackedObject`] mirrors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrackedKind {
    Issue,
    PullRequest,
    CheckSuite,
    Push,
    /// The subscription's own settings message.
    Settings,
}

impl TrackedKind {
    /// The queue that render jobs for this kind are published to.
    pub fn show_queue(self) -> &'static str {
        match self {
            TrackedKind::Issue => queues::ISSUE_SHOW,
            TrackedKind::PullRequest => queues::PULL_REQUEST_SHOW,
            TrackedKind::CheckSuite => queues::CHECK_SUITE_SHOW,
            TrackedKind::Push => queues::PUSH_SHOW,
            TrackedKind::Settings => queues::WEBHOOK_SETTINGS_SHOW,
        }
    }
}

/// A GitHub object mirrored into one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: TrackedObjectId,
    pub subscription_id: SubscriptionId,
    pub kind: TrackedKind,
    pub external_id: String,
    /// Scope for "replace the previous row" writes (the head branch of a check suite).
    pub group_key: Option<String>,
    /// Denormalised snapshot used only for rendering.
    pub info: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields written by a tracked-object upsert.
#[derive(Debug, Clone)]
pub struct NewTrackedObject {
    pub subscription_id: SubscriptionId,
    pub kind: TrackedKind,
    pub external_id: String,
    pub group_key: Option<String>,
    pub info: serde_json::Value,
}

/// Mapping from a tracked object to the chat message currently showing it.
///
/// A row without `chat_message_id` is a claim: some renderer won the right to
/// send the first message and has not recorded the result yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageIdentity {
    pub tracked_object_id: TrackedObjectId,
    pub chat_message_id: Option<ChatMessageId>,
    pub created_at: String,
}

/// Result of trying to claim the first send for a tracked object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller inserted the identity row and must send the message.
    Claimed,
    /// Another renderer got there first.
    Taken(MessageIdentity),
}

/// One inline keyboard button carrying a callback token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Inline keyboard attached to a chat message, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

/// A message ready to be sent or edited: formatted text plus optional keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

/// A chat member as reported by the chat API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMember {
    pub user_id: i64,
    /// Owner or administrator of the chat.
    pub privileged: bool,
}
