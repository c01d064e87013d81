// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types that do not belong in `octorelay-core`.

use serde::{Deserialize, Serialize};

/// A row of the `queue` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: Vec<u8>,
    /// One of `pending`, `processing`, `completed`, `failed`, `expired`.
    pub status: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub locked_until: Option<String>,
    pub expires_at: Option<String>,
    pub available_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
