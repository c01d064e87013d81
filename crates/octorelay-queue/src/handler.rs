// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler base: the only place that turns handler results into ack or nack.
//!
//! | result               | disposition | log level |
//! |----------------------|-------------|-----------|
//! | `Ok(Done)`           | ack         | debug     |
//! | `Ok(Skip(why))`      | ack         | debug     |
//! | `Ok(Reject(why))`    | nack        | warn      |
//! | `Err(_)`             | nack        | error     |
//!
//! An envelope that does not decode into the handler's event type is a
//! `Reject`.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use octorelay_core::{Broker, Delivery, RelayError};

use crate::envelope::{Envelope, Event};

/// What a handler decided about one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Processed.
    Done,
    /// Intentionally not processed (feature off, object gone, ...).
    Skip(String),
    /// The message is unprocessable; leave it to broker retry policy.
    Reject(String),
}

impl Outcome {
    pub fn skip(why: impl Into<String>) -> Self {
        Outcome::Skip(why.into())
    }

    pub fn reject(why: impl Into<String>) -> Self {
        Outcome::Reject(why.into())
    }
}

/// How a delivery gets settled with the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Nack,
}

/// A queue consumer callback working on raw envelopes.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn handle(&self, envelope: Envelope) -> Result<Outcome, RelayError>;
}

/// A handler for one [`Event`] type. Wrap in [`Typed`] to register it.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    type Event: Event;

    fn name(&self) -> &str;

    async fn handle(&self, event: Self::Event) -> Result<Outcome, RelayError>;
}

/// Adapts an [`EventHandler`] to [`Handler`], rejecting undecodable payloads.
pub struct Typed<H>(pub H);

#[async_trait]
impl<H: EventHandler> Handler for Typed<H> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn handle(&self, envelope: Envelope) -> Result<Outcome, RelayError> {
        match envelope.into_event::<H::Event>() {
            Ok(event) => self.0.handle(event).await,
            Err(e) => Ok(Outcome::reject(e.to_string())),
        }
    }
}

/// Runs `handler` on `delivery` and maps the result to a disposition, logging
/// it.
pub async fn process(handler: &dyn Handler, delivery: &Delivery) -> Disposition {
    let envelope = match Envelope::decode(&delivery.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(
                handler = handler.name(),
                queue = %delivery.queue,
                tag = delivery.tag,
                error = %e,
                "rejecting undecodable message"
            );
            return Disposition::Nack;
        }
    };

    match handler.handle(envelope).await {
        Ok(Outcome::Done) => {
            debug!(handler = handler.name(), tag = delivery.tag, "message handled");
            Disposition::Ack
        }
        Ok(Outcome::Skip(why)) => {
            debug!(handler = handler.name(), tag = delivery.tag, reason = %why, "message skipped");
            Disposition::Ack
        }
        Ok(Outcome::Reject(why)) => {
            warn!(
                handler = handler.name(),
                tag = delivery.tag,
                attempts = delivery.attempts,
                reason = %why,
                "message rejected"
            );
            Disposition::Nack
        }
        Err(e) => {
            error!(
                handler = handler.name(),
                tag = delivery.tag,
                attempts = delivery.attempts,
                error = %e,
                "message handler failed"
            );
            Disposition::Nack
        }
    }
}

/// Processes `delivery` and settles it with exactly one ack or nack.
pub async fn settle(broker: &dyn Broker, handler: &dyn Handler, delivery: Delivery) {
    let disposition = process(handler, &delivery).await;
    let result = match disposition {
        Disposition::Ack => broker.ack(&delivery).await,
        Disposition::Nack => broker.nack(&delivery).await,
    };
    if let Err(e) = result {
        // The broker redelivers after the lock lapses.
        error!(
            queue = %delivery.queue,
            tag = delivery.tag,
            ?disposition,
            error = %e,
            "failed to settle delivery"
        );
    }
}
