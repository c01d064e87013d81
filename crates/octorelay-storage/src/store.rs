// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`RelayStore`] trait.

use async_trait::async_trait;

use octorelay_core::types::{
    ChatId, ChatMessageId, ClaimOutcome, MessageIdentity, NewSubscription, NewTrackedObject,
    Subscription, SubscriptionId, SubscriptionSettings, TrackedKind, TrackedObject,
    TrackedObjectId,
};
use octorelay_core::{RelayError, RelayStore};

use crate::database::Database;
use crate::queries::{identities, subscriptions, tracked};

/// SQLite-backed relay store. Delegates every call to the typed query modules.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl RelayStore for SqliteStore {
    async fn subscriptions_for_repository(
        &self,
        repository_full_name: &str,
    ) -> Result<Vec<Subscription>, RelayError> {
        subscriptions::list_for_repository(&self.db, repository_full_name).await
    }

    async fn subscriptions_for_chat(&self, chat_id: ChatId) -> Result<Vec<Subscription>, RelayError> {
        subscriptions::list_for_chat(&self.db, chat_id).await
    }

    async fn subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>, RelayError> {
        subscriptions::get(&self.db, id).await
    }

    async fn find_subscription(
        &self,
        chat_id: ChatId,
        repository_full_name: &str,
    ) -> Result<Option<Subscription>, RelayError> {
        subscriptions::find(&self.db, chat_id, repository_full_name).await
    }

    async fn save_subscription(&self, new: &NewSubscription) -> Result<Subscription, RelayError> {
        subscriptions::upsert(&self.db, new).await
    }

    async fn update_settings(
        &self,
        id: SubscriptionId,
        settings: &SubscriptionSettings,
    ) -> Result<(), RelayError> {
        subscriptions::update_settings(&self.db, id, settings).await
    }

    async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool, RelayError> {
        subscriptions::delete(&self.db, id).await
    }

    async fn save_tracked(&self, object: &NewTrackedObject) -> Result<TrackedObject, RelayError> {
        tracked::upsert(&self.db, object).await
    }

    async fn replace_tracked_in_group(
        &self,
        object: &NewTrackedObject,
    ) -> Result<TrackedObject, RelayError> {
        tracked::replace_in_group(&self.db, object).await
    }

    async fn tracked(&self, id: TrackedObjectId) -> Result<Option<TrackedObject>, RelayError> {
        tracked::get(&self.db, id).await
    }

    async fn find_tracked(
        &self,
        subscription_id: SubscriptionId,
        kind: TrackedKind,
        external_id: &str,
    ) -> Result<Option<TrackedObject>, RelayError> {
        tracked::find(&self.db, subscription_id, kind, external_id).await
    }

    async fn delete_stale_tracked(
        &self,
        kind: TrackedKind,
        max_age_secs: u64,
    ) -> Result<usize, RelayError> {
        tracked::delete_stale(&self.db, kind, max_age_secs).await
    }

    async fn message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
    ) -> Result<Option<MessageIdentity>, RelayError> {
        identities::get(&self.db, tracked_object_id).await
    }

    async fn claim_message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
        claim_ttl_secs: u64,
    ) -> Result<ClaimOutcome, RelayError> {
        identities::claim(&self.db, tracked_object_id, claim_ttl_secs).await
    }

    async fn record_chat_message(
        &self,
        tracked_object_id: TrackedObjectId,
        chat_message_id: ChatMessageId,
    ) -> Result<(), RelayError> {
        identities::record(&self.db, tracked_object_id, chat_message_id).await
    }

    async fn delete_message_identity(
        &self,
        tracked_object_id: TrackedObjectId,
        expected: Option<ChatMessageId>,
    ) -> Result<bool, RelayError> {
        identities::delete(&self.db, tracked_object_id, expected).await
    }

    async fn delete_abandoned_claims(&self, claim_ttl_secs: u64) -> Result<usize, RelayError> {
        identities::delete_abandoned(&self.db, claim_ttl_secs).await
    }
}
