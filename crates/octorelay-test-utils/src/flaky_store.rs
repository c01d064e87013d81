// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`RelayStore`] wrapper that fails selected writes on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use octorelay_core::types::{
    ChatId, ChatMessageId, ClaimOutcome, MessageIdentity, NewSubscription, NewTrackedObject,
    Subscription, SubscriptionId, SubscriptionSettings, TrackedKind, TrackedObject,
    TrackedObjectId,
};
use octorelay_core::{RelayError, RelayStore};

/// Delegates to an inner store, failing the next N `record_chat_message`
/// calls.
pub struct FlakyStore {
    inner: Arc<dyn RelayStore>,
    record_failures: AtomicU32,
    record_calls: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn RelayStore>) -> Self {
        Self {
            inner,
            record_failures: AtomicU32::new(0),
            record_calls: AtomicU32::new(0),
        }
    }

    pub fn fail_next_records(&self, count: u32) {
        self.record_failures.store(count, Ordering::SeqCst);
    }

    /// `record_chat_message` calls seen so far, failed ones included.
    pub fn record_calls(&self) -> u32 {
        self.record_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayStore for FlakyStore {
    async fn subscriptions_for_repository(
        &self,
        repository_full_name: &str,
    ) -> Result<Vec<Subscription>, RelayError> {
        self.inner.subscriptions_for_repository(repository_full_name).await
    }

    async fn subscriptions_for_chat(&self, chat_id: ChatId) -> Result<Vec<Subscription>, RelayError> {
        self.inner.subscriptions_for_chat(chat_id).await
    }

    async fn subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>, RelayError> {
        self.inner.subscription(id).await
    }

    async fn find_subscription(
        &self,
        chat_id: ChatId,
        repository_full_name: &str,
    ) -> Result<Option<Subscription>, RelayError> {
        self.inner.find_subscription(chat_id, repository_full_name).await
    }

    async fn save_subscription(&self, new: &NewSubscription) -> Result<Subscription, RelayError> {
        self.inner.save_subscription(new).await
    }

    async fn update_settings(
        &self,
        id: SubscriptionId,
        settings: &SubscriptionSettings,
    ) -> Result<(), RelayError> {
        self.inner.update_settings(id, settings).await
    }

    async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool, RelayError> {
        self.inner.delete_subscription(id).await
    }

    async fn save_tracked(&self, object: &NewTrackedObject) -> Result<TrackedObject, RelayError> {
        self.inner.save_tracked(object).await
    }

    async fn replace_tracked_in_group(
        &self,
        object: &NewTrackedObject,
    ) -> Result<TrackedObject, RelayError> {
        self.inner.replace_tracked_in_group(object).await
    }

    async fn tracked(&self, id: TrackedObjectId) -> Result<Option<TrackedObject>, RelayError> {
        self.inner.tracked(id).await
    }

    async fn find_tracked(
        &self,
        subscription_id: SubscriptionId,
        kind: TrackedKind,
        external_id: &str,
    ) -> Result<Option<TrackedObject>, RelayError> {
        self.inner.find_tracked(subscription_id, kind, external_id).await
    }

    async fn delete_stale_tracked(
        &self,
        kind: TrackedKind,
        max_age_secs: u64,
    ) -> Result<usize, RelayError> {
        self.inner.delete_stale_tracked(kind, max_age_secs).await
    }

    async fn message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
    ) -> Result<Option<MessageIdentity>, RelayError> {
        self.inner.message_identity(tracked_object_id).await
    }

    async fn claim_message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
        claim_ttl_secs: u64,
    ) -> Result<ClaimOutcome, RelayError> {
        self.inner
            .claim_message_identity(tracked_object_id, claim_ttl_secs)
            .await
    }

    async fn record_chat_message(
        &self,
        tracked_object_id: TrackedObjectId,
        chat_message_id: ChatMessageId,
    ) -> Result<(), RelayError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .record_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RelayError::storage("database is locked"));
        }
        self.inner
            .record_chat_message(tracked_object_id, chat_message_id)
            .await
    }

    async fn delete_message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
        expected: Option<ChatMessageId>,
    ) -> Result<bool, RelayError> {
        self.inner
            .delete_message_identity(tracked_object_id, expected)
            .await
    }

    async fn delete_abandoned_claims(&self, claim_ttl_secs: u64) -> Result<usize, RelayError> {
        self.inner.delete_abandoned_claims(claim_ttl_secs).await
    }
}
