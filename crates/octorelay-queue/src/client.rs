// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue client: publishing and bounded-prefetch consumers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use octorelay_core::{Broker, RelayError};

use crate::envelope::{Envelope, Event};
use crate::handler::{settle, Handler};

/// Cloneable handle over a shared [`Broker`].
#[derive(Clone)]
pub struct QueueClient {
    broker: Arc<dyn Broker>,
    poll_interval: Duration,
}

impl QueueClient {
    pub fn new(broker: Arc<dyn Broker>, poll_interval: Duration) -> Self {
        Self {
            broker,
            poll_interval,
        }
    }

    pub fn broker(&self) -> &Arc<dyn Broker> {
        &self.broker
    }

    /// Publishes `event` to `queue`.
    pub async fn publish<E: Event>(&self, queue: &str, event: &E) -> Result<(), RelayError> {
        self.publish_envelope(&Envelope::new(queue, event)?).await
    }

    /// Publishes `event` to `queue`, dropped by the broker if not delivered
    /// within `expires_after_ms`.
    pub async fn publish_expiring<E: Event>(
        &self,
        queue: &str,
        event: &E,
        expires_after_ms: u64,
    ) -> Result<(), RelayError> {
        let envelope = Envelope::new(queue, event)?.expires_after(expires_after_ms);
        self.publish_envelope(&envelope).await
    }

    pub async fn publish_envelope(&self, envelope: &Envelope) -> Result<(), RelayError> {
        let body = envelope.encode()?;
        self.broker
            .publish(&envelope.queue, body, envelope.publish_options())
            .await?;
        debug!(queue = %envelope.queue, kind = %envelope.kind, "envelope published");
        Ok(())
    }

    /// Spawns a consumer for `queue` that keeps at most `prefetch` deliveries
    /// in flight. The task returns once `cancel` fires and in-flight
    /// deliveries are settled.
    pub fn consume(
        &self,
        queue: &str,
        prefetch: usize,
        handler: Arc<dyn Handler>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let consumer = Consumer {
            broker: self.broker.clone(),
            queue: queue.to_string(),
            prefetch: prefetch.max(1),
            poll_interval: self.poll_interval,
            handler,
        };
        tokio::spawn(consumer.run(cancel))
    }
}

struct Consumer {
    broker: Arc<dyn Broker>,
    queue: String,
    prefetch: usize,
    poll_interval: Duration,
    handler: Arc<dyn Handler>,
}

impl Consumer {
    async fn run(self, cancel: CancellationToken) {
        let permits = Arc::new(Semaphore::new(self.prefetch));
        let mut in_flight = JoinSet::new();
        info!(
            queue = %self.queue,
            handler = self.handler.name(),
            prefetch = self.prefetch,
            backend = self.broker.name(),
            "consumer started"
        );

        loop {
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            while in_flight.try_join_next().is_some() {}

            let delivery = match self.broker.fetch(&self.queue).await {
                Ok(Some(delivery)) => delivery,
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.broker.wait_for_publish(&self.queue, self.poll_interval) => {}
                    }
                    continue;
                }
                Err(e) => {
                    drop(permit);
                    error!(queue = %self.queue, error = %e, "fetch failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                    continue;
                }
            };

            let broker = self.broker.clone();
            let handler = self.handler.clone();
            in_flight.spawn(async move {
                settle(broker.as_ref(), handler.as_ref(), delivery).await;
                drop(permit);
            });
        }

        let draining = in_flight.len();
        while in_flight.join_next().await.is_some() {}
        info!(queue = %self.queue, drained = draining, "consumer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{EventHandler, Outcome, Typed};
    use crate::memory::MemoryBroker;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Serialize, Deserialize)]
    struct Tick(u32);

    impl Event for Tick {
        const KIND: &'static str = "tick";
    }

    /// Blocks every call until `release` is notified, tracking concurrency.
    struct Gate {
        running: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicUsize,
        release: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl EventHandler for Arc<Gate> {
        type Event = Tick;

        fn name(&self) -> &str {
            "gate"
        }

        async fn handle(&self, _tick: Tick) -> Result<Outcome, RelayError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let permit = self.release.acquire().await.map_err(|e| RelayError::Internal(e.to_string()))?;
            permit.forget();
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Done)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn prefetch_bounds_in_flight_deliveries() {
        let broker = Arc::new(MemoryBroker::new(5));
        let client = QueueClient::new(broker.clone(), Duration::from_millis(10));
        for i in 0..6 {
            client.publish("ticks", &Tick(i)).await.unwrap();
        }

        let gate = Arc::new(Gate {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            release: tokio::sync::Semaphore::new(0),
        });
        let cancel = CancellationToken::new();
        let consumer = client.consume("ticks", 2, Arc::new(Typed(gate.clone())), cancel.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(gate.running.load(Ordering::SeqCst), 2);
        assert_eq!(broker.pending("ticks"), 4);

        gate.release.add_permits(6);
        for _ in 0..200 {
            if gate.finished.load(Ordering::SeqCst) == 6 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gate.finished.load(Ordering::SeqCst), 6);
        assert_eq!(gate.peak.load(Ordering::SeqCst), 2);

        cancel.cancel();
        consumer.await.unwrap();
        assert_eq!(broker.stats().acked, 6);
    }

    #[tokio::test]
    async fn consumer_stops_on_cancel_while_idle() {
        let broker = Arc::new(MemoryBroker::new(5));
        let client = QueueClient::new(broker, Duration::from_secs(3600));
        let gate = Arc::new(Gate {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            release: tokio::sync::Semaphore::new(0),
        });
        let cancel = CancellationToken::new();
        let consumer = client.consume("idle", 1, Arc::new(Typed(gate)), cancel.clone());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer did not stop")
            .unwrap();
    }
}
