// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits implemented by the storage, queue, and chat adapter crates.
//!
//! All traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` inside the relay context.

pub mod broker;
pub mod chat;
pub mod store;

pub use broker::{Broker, Delivery, PublishOptions};
pub use chat::ChatApi;
pub use store::RelayStore;
