// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function takes a [`crate::Database`] and runs
//! one closure on the writer thread.

pub mod identities;
pub mod queue;
pub mod subscriptions;
pub mod tracked;
