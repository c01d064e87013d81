// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence port for subscriptions, tracked objects, and message identities.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{
    ChatId, ChatMessageId, ClaimOutcome, MessageIdentity, NewSubscription, NewTrackedObject,
    Subscription, SubscriptionId, SubscriptionSettings, TrackedKind, TrackedObject,
    TrackedObjectId,
};

/// Storage used by the relay pipeline.
///
/// Plain find/save/delete operations per entity, plus the two writes that must
/// be atomic: claiming a message identity and replacing a check suite within
/// its group.
#[async_trait]
pub trait RelayStore: Send + Sync + 'static {
    // --- Subscriptions ---

    async fn subscriptions_for_repository(
        &self,
        repository_full_name: &str,
    ) -> Result<Vec<Subscription>, RelayError>;

    async fn subscriptions_for_chat(&self, chat_id: ChatId) -> Result<Vec<Subscription>, RelayError>;

    async fn subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>, RelayError>;

    async fn find_subscription(
        &self,
        chat_id: ChatId,
        repository_full_name: &str,
    ) -> Result<Option<Subscription>, RelayError>;

    /// Creates the subscription, or replaces the secret of an existing one.
    async fn save_subscription(&self, new: &NewSubscription) -> Result<Subscription, RelayError>;

    async fn update_settings(
        &self,
        id: SubscriptionId,
        settings: &SubscriptionSettings,
    ) -> Result<(), RelayError>;

    /// Deletes a subscription with its tracked objects and identities.
    /// Returns `false` if nothing matched.
    async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool, RelayError>;

    // --- Tracked objects ---

    /// Inserts or updates by `(subscription_id, kind, external_id)`.
    async fn save_tracked(&self, object: &NewTrackedObject) -> Result<TrackedObject, RelayError>;

    /// In one transaction: deletes every other object of the same subscription,
    /// kind, and `group_key`, then upserts `object`.
    async fn replace_tracked_in_group(
        &self,
        object: &NewTrackedObject,
    ) -> Result<TrackedObject, RelayError>;

    async fn tracked(&self, id: TrackedObjectId) -> Result<Option<TrackedObject>, RelayError>;

    async fn find_tracked(
        &self,
        subscription_id: SubscriptionId,
        kind: TrackedKind,
        external_id: &str,
    ) -> Result<Option<TrackedObject>, RelayError>;

    /// Deletes objects of `kind` whose `updated_at` is older than `max_age_secs`.
    async fn delete_stale_tracked(
        &self,
        kind: TrackedKind,
        max_age_secs: u64,
    ) -> Result<usize, RelayError>;

    // --- Message identities ---

    async fn message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
    ) -> Result<Option<MessageIdentity>, RelayError>;

    /// Inserts a claim row under the uniqueness constraint. An existing claim
    /// older than `claim_ttl_secs` without a message id is replaced in the same
    /// transaction.
    async fn claim_message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
        claim_ttl_secs: u64,
    ) -> Result<ClaimOutcome, RelayError>;

    /// Stores the id of the message sent for a claim.
    async fn record_chat_message(
        &self,
        tracked_object_id: TrackedObjectId,
        chat_message_id: ChatMessageId,
    ) -> Result<(), RelayError>;

    /// Deletes the identity row. With `expected` set, only deletes if the row
    /// still points at that message. Returns whether a row was deleted.
    async fn delete_message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
        expected: Option<ChatMessageId>,
    ) -> Result<bool, RelayError>;

    /// Deletes claims without a message id older than `claim_ttl_secs`.
    async fn delete_abandoned_claims(&self, claim_ttl_secs: u64) -> Result<usize, RelayError>;
}
