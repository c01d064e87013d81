// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness: a temp SQLite store, a memory broker, and a mock chat.

use std::sync::Arc;
use std::time::Duration;

use octorelay_core::types::{
    ChatId, NewSubscription, NewTrackedObject, Subscription, TrackedKind, TrackedObject,
};
use octorelay_core::{Broker, RelayError, RelayStore};
use octorelay_queue::{Envelope, Event, MemoryBroker, QueueClient};
use octorelay_storage::{Database, SqliteStore};
use tempfile::TempDir;

use crate::mock_chat::MockChat;

/// Everything a pipeline test needs, backed by a throwaway database.
///
/// The temp directory lives as long as the harness.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub broker: Arc<MemoryBroker>,
    pub chat: Arc<MockChat>,
    pub queue: QueueClient,
    _dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Result<Self, RelayError> {
        let dir = tempfile::tempdir().map_err(RelayError::storage)?;
        let path = dir.path().join("octorelay-test.db");
        let db = Database::open(&path.to_string_lossy()).await?;
        let broker = Arc::new(MemoryBroker::new(5));
        let queue = QueueClient::new(broker.clone() as Arc<dyn Broker>, Duration::from_millis(10));
        Ok(Self {
            store: Arc::new(SqliteStore::new(db)),
            broker,
            chat: Arc::new(MockChat::new()),
            queue,
            _dir: dir,
        })
    }

    /// Creates (or re-keys) a subscription.
    pub async fn subscribe(
        &self,
        chat_id: i64,
        repository_full_name: &str,
        secret: &str,
    ) -> Result<Subscription, RelayError> {
        self.store
            .save_subscription(&NewSubscription {
                chat_id: ChatId(chat_id),
                repository_full_name: repository_full_name.to_string(),
                secret: secret.to_string(),
            })
            .await
    }

    /// Upserts a tracked object with the given `info` snapshot.
    pub async fn track(
        &self,
        subscription: &Subscription,
        kind: TrackedKind,
        external_id: &str,
        info: serde_json::Value,
    ) -> Result<TrackedObject, RelayError> {
        self.store
            .save_tracked(&NewTrackedObject {
                subscription_id: subscription.id,
                kind,
                external_id: external_id.to_string(),
                group_key: None,
                info,
            })
            .await
    }

    /// Decoded events waiting on `queue`, oldest first. Envelopes of another
    /// kind are skipped.
    pub fn pending_events<E: Event>(&self, queue: &str) -> Vec<E> {
        self.broker
            .pending_bodies(queue)
            .iter()
            .filter_map(|body| Envelope::decode(body).ok())
            .filter_map(|envelope| envelope.into_event::<E>().ok())
            .collect()
    }
}
