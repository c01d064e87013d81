// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Octorelay.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed queries for subscriptions,
//! tracked objects, and message identities, and a durable queue broker.

pub mod broker;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use broker::SqliteBroker;
pub use database::Database;
pub use models::QueueEntry;
pub use store::SqliteStore;
