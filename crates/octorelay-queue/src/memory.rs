// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process [`Broker`] with the same retry, expiry, and dead-letter
//! semantics as the SQLite broker. Messages do not survive a restart.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::warn;

use octorelay_core::{Broker, Delivery, PublishOptions, RelayError};

const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct Message {
    tag: i64,
    body: Vec<u8>,
    attempts: u32,
    expires_at: Option<Instant>,
    available_at: Option<Instant>,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Message>,
    in_flight: HashMap<i64, (Message, Instant)>,
    dead: Vec<Message>,
    waker: Arc<Notify>,
}

/// Settlement counters, for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub published: u64,
    pub acked: u64,
    pub nacked: u64,
    pub dead_lettered: u64,
    pub expired: u64,
}

pub struct MemoryBroker {
    max_attempts: u32,
    delivery_timeout: Duration,
    next_tag: AtomicI64,
    queues: Mutex<HashMap<String, QueueState>>,
    stats: Mutex<MemoryStats>,
}

impl MemoryBroker {
    pub fn new(max_attempts: u32) -> Self {
        Self::with_delivery_timeout(max_attempts, DEFAULT_DELIVERY_TIMEOUT)
    }

    pub fn with_delivery_timeout(max_attempts: u32, delivery_timeout: Duration) -> Self {
        Self {
            max_attempts,
            delivery_timeout,
            next_tag: AtomicI64::new(1),
            queues: Mutex::new(HashMap::new()),
            stats: Mutex::new(MemoryStats::default()),
        }
    }

    pub fn stats(&self) -> MemoryStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Messages waiting for delivery on `queue` (not counting in-flight ones).
    pub fn pending(&self, queue: &str) -> usize {
        self.queues().get(queue).map_or(0, |q| q.ready.len())
    }

    /// Bodies of pending messages on `queue`, oldest first.
    pub fn pending_bodies(&self, queue: &str) -> Vec<Vec<u8>> {
        self.queues()
            .get(queue)
            .map(|q| q.ready.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    /// Bodies of dead-lettered messages on `queue`.
    pub fn dead_letters(&self, queue: &str) -> Vec<Vec<u8>> {
        self.queues()
            .get(queue)
            .map(|q| q.dead.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<String, QueueState>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self, f: impl FnOnce(&mut MemoryStats)) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Moves a failed message back to `ready`, or to `dead` at the attempt limit.
    fn retry_or_bury(&self, state: &mut QueueState, mut message: Message) -> bool {
        message.attempts += 1;
        if message.attempts >= self.max_attempts {
            state.dead.push(message);
            self.bump(|s| s.dead_lettered += 1);
            true
        } else {
            state.ready.push_back(message);
            state.waker.notify_one();
            false
        }
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(
        &self,
        queue: &str,
        body: Vec<u8>,
        options: PublishOptions,
    ) -> Result<(), RelayError> {
        let now = Instant::now();
        let message = Message {
            tag: self.next_tag.fetch_add(1, Ordering::Relaxed),
            body,
            attempts: 0,
            expires_at: options
                .expires_after_ms
                .map(|ms| now + Duration::from_millis(ms)),
            available_at: options.delay_ms.map(|ms| now + Duration::from_millis(ms)),
        };
        let mut queues = self.queues();
        let state = queues.entry(queue.to_string()).or_default();
        state.ready.push_back(message);
        state.waker.notify_one();
        drop(queues);
        self.bump(|s| s.published += 1);
        Ok(())
    }

    async fn fetch(&self, queue: &str) -> Result<Option<Delivery>, RelayError> {
        let now = Instant::now();
        let mut queues = self.queues();
        let Some(state) = queues.get_mut(queue) else {
            return Ok(None);
        };

        let lapsed: Vec<i64> = state
            .in_flight
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(tag, _)| *tag)
            .collect();
        for tag in lapsed {
            if let Some((message, _)) = state.in_flight.remove(&tag) {
                warn!(queue, tag, "delivery lock lapsed");
                self.retry_or_bury(state, message);
            }
        }

        let before = state.ready.len();
        state
            .ready
            .retain(|m| !m.expires_at.is_some_and(|at| at <= now));
        let expired = (before - state.ready.len()) as u64;
        if expired > 0 {
            self.bump(|s| s.expired += expired);
        }

        let due = state
            .ready
            .iter()
            .position(|m| m.available_at.is_none_or(|at| at <= now));
        if let Some(message) = due.and_then(|i| state.ready.remove(i)) {
            let delivery = Delivery {
                tag: message.tag,
                queue: queue.to_string(),
                body: message.body.clone(),
                attempts: message.attempts,
            };
            state
                .in_flight
                .insert(message.tag, (message, now + self.delivery_timeout));
            return Ok(Some(delivery));
        }
        Ok(None)
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), RelayError> {
        let removed = self
            .queues()
            .get_mut(&delivery.queue)
            .and_then(|state| state.in_flight.remove(&delivery.tag));
        if removed.is_some() {
            self.bump(|s| s.acked += 1);
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery) -> Result<(), RelayError> {
        let mut queues = self.queues();
        let Some(state) = queues.get_mut(&delivery.queue) else {
            return Ok(());
        };
        let Some((message, _)) = state.in_flight.remove(&delivery.tag) else {
            return Ok(());
        };
        if self.retry_or_bury(state, message) {
            warn!(queue = %delivery.queue, tag = delivery.tag, "message dead-lettered");
        }
        drop(queues);
        self.bump(|s| s.nacked += 1);
        Ok(())
    }

    async fn wait_for_publish(&self, queue: &str, timeout: Duration) {
        let waker = self
            .queues()
            .entry(queue.to_string())
            .or_default()
            .waker
            .clone();
        let _ = tokio::time::timeout(timeout, waker.notified()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn publish(broker: &MemoryBroker, body: &[u8], expires: Option<u64>) {
        broker
            .publish(
                "q",
                body.to_vec(),
                PublishOptions {
                    expires_after_ms: expires,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fifo_and_ack() {
        let broker = MemoryBroker::new(3);
        publish(&broker, b"1", None).await;
        publish(&broker, b"2", None).await;

        let first = broker.fetch("q").await.unwrap().unwrap();
        assert_eq!(first.body, b"1");
        broker.ack(&first).await.unwrap();
        assert_eq!(broker.fetch("q").await.unwrap().unwrap().body, b"2");
        assert!(broker.fetch("q").await.unwrap().is_none());
        assert_eq!(broker.stats().acked, 1);
    }

    #[tokio::test]
    async fn nack_dead_letters_at_max_attempts() {
        let broker = MemoryBroker::new(2);
        publish(&broker, b"x", None).await;

        let d = broker.fetch("q").await.unwrap().unwrap();
        broker.nack(&d).await.unwrap();
        let d = broker.fetch("q").await.unwrap().unwrap();
        assert_eq!(d.attempts, 1);
        broker.nack(&d).await.unwrap();

        assert!(broker.fetch("q").await.unwrap().is_none());
        assert_eq!(broker.dead_letters("q"), vec![b"x".to_vec()]);
        assert_eq!(broker.stats().dead_lettered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_messages_are_dropped() {
        let broker = MemoryBroker::new(3);
        publish(&broker, b"old", Some(1_000)).await;
        publish(&broker, b"new", None).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(broker.fetch("q").await.unwrap().unwrap().body, b"new");
        assert_eq!(broker.stats().expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_message_waits_its_turn() {
        let broker = MemoryBroker::new(3);
        broker
            .publish(
                "q",
                b"later".to_vec(),
                PublishOptions {
                    delay_ms: Some(1_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        publish(&broker, b"now", None).await;

        assert_eq!(broker.fetch("q").await.unwrap().unwrap().body, b"now");
        assert!(broker.fetch("q").await.unwrap().is_none());
        assert_eq!(broker.pending("q"), 1);

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert_eq!(broker.fetch("q").await.unwrap().unwrap().body, b"later");
    }

    #[tokio::test(start_paused = true)]
    async fn unsettled_delivery_is_redelivered_after_timeout() {
        let broker = MemoryBroker::with_delivery_timeout(3, Duration::from_secs(10));
        publish(&broker, b"x", None).await;

        let first = broker.fetch("q").await.unwrap().unwrap();
        assert!(broker.fetch("q").await.unwrap().is_none());

        tokio::time::advance(Duration::from_secs(11)).await;
        let again = broker.fetch("q").await.unwrap().unwrap();
        assert_eq!(again.tag, first.tag);
        assert_eq!(again.attempts, 1);
    }
}
