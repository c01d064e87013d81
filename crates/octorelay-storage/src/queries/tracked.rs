// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracked object queries.
//!
//! `info` is stored as JSON text and `kind` as its snake_case name; both are
//! decoded outside the writer thread.

use std::str::FromStr;

use octorelay_core::types::{
    NewTrackedObject, SubscriptionId, TrackedKind, TrackedObject, TrackedObjectId,
};
use octorelay_core::RelayError;
use rusqlite::{params, OptionalExtension, Row, Transaction};

use crate::database::{map_tr_err, seconds_ago, Database};

const COLUMNS: &str =
    "id, subscription_id, kind, external_id, group_key, info, created_at, updated_at";

/// Undecoded `tracked_objects` row.
struct RawTracked {
    id: i64,
    subscription_id: i64,
    kind: String,
    external_id: String,
    group_key: Option<String>,
    info: String,
    created_at: String,
    updated_at: String,
}

impl RawTracked {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            kind: row.get(2)?,
            external_id: row.get(3)?,
            group_key: row.get(4)?,
            info: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<TrackedObject, RelayError> {
        let kind = TrackedKind::from_str(&self.kind)
            .map_err(|e| RelayError::storage(format!("unknown tracked kind `{}`: {e}", self.kind)))?;
        let info = serde_json::from_str(&self.info)
            .map_err(|e| RelayError::payload(format!("tracked object {} info", self.id), e))?;
        Ok(TrackedObject {
            id: TrackedObjectId(self.id),
            subscription_id: SubscriptionId(self.subscription_id),
            kind,
            external_id: self.external_id,
            group_key: self.group_key,
            info,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Owned copy of a [`NewTrackedObject`] with `info` already serialized.
struct Upsert {
    subscription_id: i64,
    kind: String,
    external_id: String,
    group_key: Option<String>,
    info: String,
}

impl Upsert {
    fn new(object: &NewTrackedObject) -> Result<Self, RelayError> {
        Ok(Self {
            subscription_id: object.subscription_id.0,
            kind: object.kind.to_string(),
            external_id: object.external_id.clone(),
            group_key: object.group_key.clone(),
            info: serde_json::to_string(&object.info)
                .map_err(|e| RelayError::payload("tracked object info", e))?,
        })
    }

    fn execute(&self, tx: &Transaction<'_>) -> rusqlite::Result<RawTracked> {
        tx.query_row(
            &format!(
                "INSERT INTO tracked_objects (subscription_id, kind, external_id, group_key, info)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (subscription_id, kind, external_id) DO UPDATE SET
                     group_key = excluded.group_key,
                     info = excluded.info,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 RETURNING {COLUMNS}"
            ),
            params![
                self.subscription_id,
                self.kind,
                self.external_id,
                self.group_key,
                self.info
            ],
            RawTracked::from_row,
        )
    }
}

/// Inserts or updates by `(subscription_id, kind, external_id)`.
pub async fn upsert(db: &Database, object: &NewTrackedObject) -> Result<TrackedObject, RelayError> {
    let upsert = Upsert::new(object)?;
    let raw = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let raw = upsert.execute(&tx)?;
            tx.commit()?;
            Ok(raw)
        })
        .await
        .map_err(map_tr_err)?;
    raw.decode()
}

/// Deletes the other rows of the same subscription, kind, and group, then
/// upserts `object`, in one transaction. Without a `group_key` this is a
/// plain upsert.
pub async fn replace_in_group(
    db: &Database,
    object: &NewTrackedObject,
) -> Result<TrackedObject, RelayError> {
    let upsert = Upsert::new(object)?;
    let raw = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(group_key) = &upsert.group_key {
                let removed = tx.execute(
                    "DELETE FROM tracked_objects
                     WHERE subscription_id = ?1 AND kind = ?2 AND group_key = ?3
                       AND external_id != ?4",
                    params![upsert.subscription_id, upsert.kind, group_key, upsert.external_id],
                )?;
                if removed > 0 {
                    tracing::debug!(removed, group_key = %group_key, "replaced tracked objects in group");
                }
            }
            let raw = upsert.execute(&tx)?;
            tx.commit()?;
            Ok(raw)
        })
        .await
        .map_err(map_tr_err)?;
    raw.decode()
}

pub async fn get(db: &Database, id: TrackedObjectId) -> Result<Option<TrackedObject>, RelayError> {
    let raw = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM tracked_objects WHERE id = ?1"),
                params![id.0],
                RawTracked::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    raw.map(RawTracked::decode).transpose()
}

pub async fn find(
    db: &Database,
    subscription_id: SubscriptionId,
    kind: TrackedKind,
    external_id: &str,
) -> Result<Option<TrackedObject>, RelayError> {
    let kind = kind.to_string();
    let external_id = external_id.to_string();
    let raw = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM tracked_objects
                     WHERE subscription_id = ?1 AND kind = ?2 AND external_id = ?3"
                ),
                params![subscription_id.0, kind, external_id],
                RawTracked::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    raw.map(RawTracked::decode).transpose()
}

/// Deletes rows of `kind` not updated within `max_age_secs`.
pub async fn delete_stale(
    db: &Database,
    kind: TrackedKind,
    max_age_secs: u64,
) -> Result<usize, RelayError> {
    let kind = kind.to_string();
    let modifier = seconds_ago(max_age_secs);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM tracked_objects
                 WHERE kind = ?1
                   AND updated_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2)",
                params![kind, modifier],
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::subscriptions;
    use octorelay_core::types::{ChatId, NewSubscription};
    use serde_json::json;
    use tempfile::tempdir;

    async fn setup() -> (Database, SubscriptionId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        let sub = subscriptions::upsert(
            &db,
            &NewSubscription {
                chat_id: ChatId(1),
                repository_full_name: "octo/repo".into(),
                secret: "s".into(),
            },
        )
        .await
        .unwrap();
        (db, sub.id, dir)
    }

    fn suite(sub: SubscriptionId, id: &str, branch: &str) -> NewTrackedObject {
        NewTrackedObject {
            subscription_id: sub,
            kind: TrackedKind::CheckSuite,
            external_id: id.to_string(),
            group_key: Some(branch.to_string()),
            info: json!({"id": id, "head_branch": branch}),
        }
    }

    #[tokio::test]
    async fn upsert_is_unique_per_external_id() {
        let (db, sub, _dir) = setup().await;
        let issue = |title: &str| NewTrackedObject {
            subscription_id: sub,
            kind: TrackedKind::Issue,
            external_id: "7".into(),
            group_key: None,
            info: json!({"title": title}),
        };

        let first = upsert(&db, &issue("old")).await.unwrap();
        let second = upsert(&db, &issue("new")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.info["title"], "new");

        let found = find(&db, sub, TrackedKind::Issue, "7").await.unwrap().unwrap();
        assert_eq!(found.info["title"], "new");
        assert!(find(&db, sub, TrackedKind::PullRequest, "7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_in_group_keeps_only_the_latest_suite_per_branch() {
        let (db, sub, _dir) = setup().await;

        let a = replace_in_group(&db, &suite(sub, "100", "main")).await.unwrap();
        let other_branch = replace_in_group(&db, &suite(sub, "101", "dev")).await.unwrap();
        let b = replace_in_group(&db, &suite(sub, "102", "main")).await.unwrap();

        assert!(get(&db, a.id).await.unwrap().is_none());
        assert!(get(&db, other_branch.id).await.unwrap().is_some());
        assert!(get(&db, b.id).await.unwrap().is_some());

        // Re-delivery of the current suite keeps its row.
        let again = replace_in_group(&db, &suite(sub, "102", "main")).await.unwrap();
        assert_eq!(again.id, b.id);
    }

    #[tokio::test]
    async fn delete_stale_only_touches_old_rows_of_kind() {
        let (db, sub, _dir) = setup().await;
        let old = upsert(&db, &suite(sub, "1", "main")).await.unwrap();
        let fresh = upsert(&db, &suite(sub, "2", "dev")).await.unwrap();

        let old_id = old.id.0;
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE tracked_objects SET updated_at = '2000-01-01T00:00:00.000Z' WHERE id = ?1",
                    params![old_id],
                )
            })
            .await
            .unwrap();

        assert_eq!(delete_stale(&db, TrackedKind::Push, 60).await.unwrap(), 0);
        assert_eq!(delete_stale(&db, TrackedKind::CheckSuite, 60).await.unwrap(), 1);
        assert!(get(&db, fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_subscription_cascades() {
        let (db, sub, _dir) = setup().await;
        let obj = upsert(&db, &suite(sub, "1", "main")).await.unwrap();
        subscriptions::delete(&db, sub).await.unwrap();
        assert!(get(&db, obj.id).await.unwrap().is_none());
    }
}
