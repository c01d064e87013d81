// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owns the broker client and the consumer tasks of every registered handler.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use octorelay_core::RelayError;

use crate::client::QueueClient;
use crate::envelope::Event;
use crate::handler::Handler;

/// One row of the handler registration table.
pub struct Registration {
    pub queue: &'static str,
    pub prefetch: usize,
    /// Disabled registrations get no consumer.
    pub enabled: bool,
    pub handler: Arc<dyn Handler>,
}

impl Registration {
    pub fn new(queue: &'static str, prefetch: usize, handler: Arc<dyn Handler>) -> Self {
        Self {
            queue,
            prefetch,
            enabled: true,
            handler,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

pub struct Dispatcher {
    client: QueueClient,
    registrations: Vec<Registration>,
    cancel: CancellationToken,
    consumers: Vec<(&'static str, JoinHandle<()>)>,
}

impl Dispatcher {
    /// `cancel` stops every consumer started by this dispatcher.
    pub fn new(client: QueueClient, cancel: CancellationToken) -> Self {
        Self {
            client,
            registrations: Vec::new(),
            cancel,
            consumers: Vec::new(),
        }
    }

    pub fn client(&self) -> &QueueClient {
        &self.client
    }

    pub fn register(&mut self, registration: Registration) {
        self.registrations.push(registration);
    }

    pub fn register_all(&mut self, registrations: impl IntoIterator<Item = Registration>) {
        self.registrations.extend(registrations);
    }

    /// Starts one consumer per enabled registration. Returns how many started.
    pub fn start(&mut self) -> usize {
        for registration in self.registrations.drain(..) {
            if !registration.enabled {
                info!(
                    queue = registration.queue,
                    handler = registration.handler.name(),
                    "handler disabled"
                );
                continue;
            }
            let handle = self.client.consume(
                registration.queue,
                registration.prefetch,
                registration.handler,
                self.cancel.child_token(),
            );
            self.consumers.push((registration.queue, handle));
        }
        info!(consumers = self.consumers.len(), "dispatcher started");
        self.consumers.len()
    }

    pub async fn publish<E: Event>(&self, queue: &str, event: &E) -> Result<(), RelayError> {
        self.client.publish(queue, event).await
    }

    /// Cancels all consumers and waits for their in-flight deliveries.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (queue, handle) in self.consumers {
            if let Err(e) = handle.await {
                warn!(queue, error = %e, "consumer task ended abnormally");
            }
        }
        info!("dispatcher stopped");
    }
}
