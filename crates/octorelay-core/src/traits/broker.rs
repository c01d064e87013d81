// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message broker port.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RelayError;

/// Options attached to a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Drop the message instead of delivering it once this many milliseconds
    /// have passed since publishing.
    pub expires_after_ms: Option<u64>,
    /// Hold the message back for this many milliseconds before it becomes
    /// deliverable. Expiry is still counted from publishing.
    pub delay_ms: Option<u64>,
}

/// A message handed to a consumer. Must be settled with exactly one of
/// [`Broker::ack`] or [`Broker::nack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Broker-assigned identifier used to settle the delivery.
    pub tag: i64,
    pub queue: String,
    pub body: Vec<u8>,
    /// Number of earlier failed attempts for this message.
    pub attempts: u32,
}

/// A queue broker with at-least-once delivery.
///
/// Unsettled deliveries are redelivered after the broker's delivery timeout.
/// Nacked deliveries are redelivered until the broker's attempt limit, then
/// dead-lettered.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Enqueues `body` on `queue`.
    async fn publish(
        &self,
        queue: &str,
        body: Vec<u8>,
        options: PublishOptions,
    ) -> Result<(), RelayError>;

    /// Takes the next deliverable message from `queue`, if any.
    async fn fetch(&self, queue: &str) -> Result<Option<Delivery>, RelayError>;

    /// Removes a delivery from the queue.
    async fn ack(&self, delivery: &Delivery) -> Result<(), RelayError>;

    /// Rejects a delivery; the broker decides between redelivery and dead-lettering.
    async fn nack(&self, delivery: &Delivery) -> Result<(), RelayError>;

    /// Waits until something is published to `queue` or `timeout` elapses.
    async fn wait_for_publish(&self, queue: &str, timeout: Duration) {
        let _ = queue;
        tokio::time::sleep(timeout).await;
    }

    /// Deletes settled (completed, failed, expired) messages older than
    /// `older_than`. Brokers that drop settled messages immediately return 0.
    async fn purge_settled(&self, older_than: Duration) -> Result<usize, RelayError> {
        let _ = older_than;
        Ok(0)
    }
}
