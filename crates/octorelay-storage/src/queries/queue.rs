// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue operations for crash-safe message processing.

use rusqlite::{params, OptionalExtension, Row};

use octorelay_core::{PublishOptions, RelayError};

use crate::database::{map_tr_err, seconds_ago, Database};
use crate::models::QueueEntry;

const COLUMNS: &str = "id, queue_name, payload, status, attempts, max_attempts, \
     locked_until, expires_at, available_at, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        locked_until: row.get(6)?,
        expires_at: row.get(7)?,
        available_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// SQLite accepts fractional seconds in datetime modifiers.
fn millis_modifier(ms: u64) -> String {
    format!("+{}.{:03} seconds", ms / 1000, ms % 1000)
}

/// Enqueue a new item. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: Vec<u8>,
    max_attempts: u32,
    options: PublishOptions,
) -> Result<i64, RelayError> {
    let queue_name = queue_name.to_string();
    let expiry = options.expires_after_ms.map(millis_modifier);
    let delay = options.delay_ms.map(millis_modifier);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO queue (queue_name, payload, max_attempts, expires_at, available_at)
                 VALUES (?1, ?2, ?3,
                     CASE WHEN ?4 IS NULL THEN NULL
                         ELSE strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?4) END,
                     CASE WHEN ?5 IS NULL THEN NULL
                         ELSE strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?5) END)",
                params![queue_name, payload, max_attempts, expiry, delay],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Dequeue the next deliverable entry from the named queue.
///
/// In one transaction:
/// 1. entries whose lock lapsed go back to `pending` (or `failed` when the
///    lapsed delivery was the last allowed attempt), counting one attempt;
/// 2. pending entries past `expires_at` become `expired`;
/// 3. the oldest pending entry whose `available_at` has passed is marked `processing` and locked for
///    `lock_secs`.
///
/// Returns `None` if nothing is deliverable.
pub async fn dequeue(
    db: &Database,
    queue_name: &str,
    lock_secs: u64,
) -> Result<Option<QueueEntry>, RelayError> {
    let queue_name = queue_name.to_string();
    let lock = format!("+{lock_secs} seconds");
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let reclaimed = tx.execute(
                "UPDATE queue SET
                     attempts = attempts + 1,
                     status = CASE WHEN attempts + 1 >= max_attempts
                         THEN 'failed' ELSE 'pending' END,
                     locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE queue_name = ?1 AND status = 'processing'
                   AND locked_until <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![queue_name],
            )?;
            if reclaimed > 0 {
                tracing::warn!(queue = %queue_name, reclaimed, "delivery lock lapsed");
            }

            let expired = tx.execute(
                "UPDATE queue SET status = 'expired',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE queue_name = ?1 AND status = 'pending'
                   AND expires_at IS NOT NULL
                   AND expires_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![queue_name],
            )?;
            if expired > 0 {
                tracing::debug!(queue = %queue_name, expired, "dropped expired messages");
            }

            let next = tx
                .query_row(
                    &format!(
                        "UPDATE queue SET status = 'processing',
                             locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = (
                             SELECT id FROM queue
                             WHERE queue_name = ?1 AND status = 'pending'
                               AND (available_at IS NULL
                                   OR available_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                             ORDER BY id ASC LIMIT 1
                         )
                         RETURNING {COLUMNS}"
                    ),
                    params![queue_name, lock],
                    entry_from_row,
                )
                .optional()?;

            tx.commit()?;
            Ok(next)
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge successful processing of a queue entry.
pub async fn ack(db: &Database, id: i64) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a queue entry as failed.
///
/// Increments attempts. At `max_attempts` the entry is dead-lettered
/// (`failed`); otherwise it goes back to `pending` with the lock cleared.
/// Returns `true` when the entry was dead-lettered.
pub async fn fail(db: &Database, id: i64) -> Result<bool, RelayError> {
    db.connection()
        .call(move |conn| {
            let status: Option<String> = conn
                .query_row(
                    "UPDATE queue SET
                         attempts = attempts + 1,
                         status = CASE WHEN attempts + 1 >= max_attempts
                             THEN 'failed' ELSE 'pending' END,
                         locked_until = NULL,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1
                     RETURNING status",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(status.as_deref() == Some("failed"))
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch an entry by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<QueueEntry>, RelayError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM queue WHERE id = ?1"),
                params![id],
                entry_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes completed, failed, and expired entries not updated within
/// `max_age_secs`.
pub async fn purge_settled(db: &Database, max_age_secs: u64) -> Result<usize, RelayError> {
    let modifier = seconds_ago(max_age_secs);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM queue
                 WHERE status IN ('completed', 'failed', 'expired')
                   AND updated_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
                params![modifier],
            )
        })
        .await
        .map_err(map_tr_err)
}
