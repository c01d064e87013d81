// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription CRUD.

use octorelay_core::types::{
    ChatId, NewSubscription, Subscription, SubscriptionId, SubscriptionSettings,
};
use octorelay_core::RelayError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

const COLUMNS: &str = "id, chat_id, repository_full_name, secret, \
     track_pushes, track_free_ci, track_pull_request_ci, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: SubscriptionId(row.get(0)?),
        chat_id: ChatId(row.get(1)?),
        repository_full_name: row.get(2)?,
        secret: row.get(3)?,
        settings: SubscriptionSettings {
            track_pushes: row.get(4)?,
            track_free_ci: row.get(5)?,
            track_pull_request_ci: row.get(6)?,
        },
        created_at: row.get(7)?,
    })
}

/// All subscriptions of a repository, oldest first.
pub async fn list_for_repository(
    db: &Database,
    repository_full_name: &str,
) -> Result<Vec<Subscription>, RelayError> {
    let repository_full_name = repository_full_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM subscriptions
                 WHERE repository_full_name = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![repository_full_name], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// All subscriptions of a chat, ordered by repository name.
pub async fn list_for_chat(
    db: &Database,
    chat_id: ChatId,
) -> Result<Vec<Subscription>, RelayError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM subscriptions
                 WHERE chat_id = ?1 ORDER BY repository_full_name ASC"
            ))?;
            let rows = stmt.query_map(params![chat_id.0], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, id: SubscriptionId) -> Result<Option<Subscription>, RelayError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id.0],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find(
    db: &Database,
    chat_id: ChatId,
    repository_full_name: &str,
) -> Result<Option<Subscription>, RelayError> {
    let repository_full_name = repository_full_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM subscriptions
                     WHERE chat_id = ?1 AND repository_full_name = ?2"
                ),
                params![chat_id.0, repository_full_name],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts a subscription. An existing `(chat_id, repository)` row keeps its
/// id and settings and gets the new secret.
pub async fn upsert(db: &Database, new: &NewSubscription) -> Result<Subscription, RelayError> {
    let chat_id = new.chat_id.0;
    let repository_full_name = new.repository_full_name.clone();
    let secret = new.secret.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO subscriptions (chat_id, repository_full_name, secret)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT (chat_id, repository_full_name)
                     DO UPDATE SET secret = excluded.secret
                     RETURNING {COLUMNS}"
                ),
                params![chat_id, repository_full_name, secret],
                from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_settings(
    db: &Database,
    id: SubscriptionId,
    settings: &SubscriptionSettings,
) -> Result<(), RelayError> {
    let settings = *settings;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE subscriptions
                 SET track_pushes = ?1, track_free_ci = ?2, track_pull_request_ci = ?3
                 WHERE id = ?4",
                params![
                    settings.track_pushes,
                    settings.track_free_ci,
                    settings.track_pull_request_ci,
                    id.0
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes a subscription; tracked objects and identities cascade.
pub async fn delete(db: &Database, id: SubscriptionId) -> Result<bool, RelayError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM subscriptions WHERE id = ?1", params![id.0])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}
