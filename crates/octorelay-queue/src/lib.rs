// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed message queue layer for Octorelay.
//!
//! - [`Envelope`] / [`Event`]: serialized unit of work with a kind discriminator.
//! - [`QueueClient`]: publish envelopes and run bounded-prefetch consumers.
//! - [`Handler`] / [`EventHandler`] / [`Outcome`]: the handler base that turns
//!   handler results into ack or nack.
//! - [`Dispatcher`]: registration table of queue consumers with lifecycle.
//! - [`MemoryBroker`]: in-process broker for tests and non-durable deployments.

pub mod client;
pub mod dispatcher;
pub mod envelope;
pub mod events;
pub mod handler;
pub mod memory;

pub use client::QueueClient;
pub use dispatcher::{Dispatcher, Registration};
pub use envelope::{Envelope, Event};
pub use handler::{Disposition, EventHandler, Handler, Outcome, Typed};
pub use memory::MemoryBroker;
