// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable [`Broker`] on top of the `queue` table.
//!
//! Publishing wakes the queue's consumer through a per-queue [`Notify`], so
//! consumers only fall back to polling when a message was published by
//! another process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, warn};

use octorelay_config::model::QueueConfig;
use octorelay_core::{Broker, Delivery, PublishOptions, RelayError};

use crate::database::Database;
use crate::queries::queue;

/// SQLite-backed broker with lock-timeout redelivery and dead-lettering.
pub struct SqliteBroker {
    db: Database,
    max_attempts: u32,
    delivery_timeout_secs: u64,
    wakers: Mutex<HashMap<String, Arc<Notify>>>,
}

impl SqliteBroker {
    pub fn new(db: Database, max_attempts: u32, delivery_timeout_secs: u64) -> Self {
        Self {
            db,
            max_attempts,
            delivery_timeout_secs,
            wakers: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a broker from the `[queue]` config section.
    pub fn from_config(db: Database, config: &QueueConfig) -> Self {
        Self::new(db, config.max_attempts, config.delivery_timeout_secs)
    }

    fn waker(&self, queue: &str) -> Arc<Notify> {
        let mut wakers = self.wakers.lock().unwrap_or_else(PoisonError::into_inner);
        wakers
            .entry(queue.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }
}

#[async_trait]
impl Broker for SqliteBroker {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn publish(
        &self,
        queue: &str,
        body: Vec<u8>,
        options: PublishOptions,
    ) -> Result<(), RelayError> {
        let id = queue::enqueue(&self.db, queue, body, self.max_attempts, options).await?;
        debug!(queue, id, "published");
        self.waker(queue).notify_one();
        Ok(())
    }

    async fn fetch(&self, queue: &str) -> Result<Option<Delivery>, RelayError> {
        let entry = queue::dequeue(&self.db, queue, self.delivery_timeout_secs).await?;
        Ok(entry.map(|entry| Delivery {
            tag: entry.id,
            queue: entry.queue_name,
            body: entry.payload,
            attempts: entry.attempts,
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), RelayError> {
        queue::ack(&self.db, delivery.tag).await
    }

    async fn nack(&self, delivery: &Delivery) -> Result<(), RelayError> {
        let dead = queue::fail(&self.db, delivery.tag).await?;
        if dead {
            warn!(
                queue = %delivery.queue,
                id = delivery.tag,
                attempts = delivery.attempts + 1,
                "message dead-lettered"
            );
        } else {
            // Let a consumer parked in wait_for_publish pick up the retry.
            self.waker(&delivery.queue).notify_one();
        }
        Ok(())
    }

    async fn wait_for_publish(&self, queue: &str, timeout: Duration) {
        let waker = self.waker(queue);
        let _ = tokio::time::timeout(timeout, waker.notified()).await;
    }

    async fn purge_settled(&self, older_than: Duration) -> Result<usize, RelayError> {
        queue::purge_settled(&self.db, older_than.as_secs()).await
    }
}
