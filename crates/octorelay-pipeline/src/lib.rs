// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event pipeline for Octorelay.
//!
//! Queue handlers that turn GitHub webhook deliveries into tracked objects,
//! render tracked objects into exactly one live Telegram message each, and
//! react to chat commands and inline keyboard taps. [`registry`] is the table
//! that wires every handler to its queue.

pub mod callback;
pub mod commands;
pub mod context;
pub mod gc;
pub mod info;
pub mod messages;
pub mod registry;
pub mod render;
pub mod webhook;

pub use context::{RelayContext, RelaySettings};
pub use gc::{GarbageCollector, GcReport};
pub use registry::registrations;
