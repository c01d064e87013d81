// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Octorelay integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a Telegram bot or a GitHub account.
//!
//! # Components
//!
//! - [`MockChat`] - in-memory chat API recording every call
//! - [`FlakyStore`] - store wrapper that fails chosen writes
//! - [`TestHarness`] - temp SQLite store, memory broker, and mock chat wired together

pub mod flaky_store;
pub mod harness;
pub mod mock_chat;

pub use flaky_store::FlakyStore;
pub use harness::TestHarness;
pub use mock_chat::{ChatCall, MockChat};
