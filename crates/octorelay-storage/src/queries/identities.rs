// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message identity queries, including the first-send claim.

use octorelay_core::types::{ChatMessageId, ClaimOutcome, MessageIdentity, TrackedObjectId};
use octorelay_core::RelayError;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::{map_tr_err, seconds_ago, Database};

fn from_row(row: &Row<'_>) -> rusqlite::Result<MessageIdentity> {
    Ok(MessageIdentity {
        tracked_object_id: TrackedObjectId(row.get(0)?),
        chat_message_id: row.get::<_, Option<i32>>(1)?.map(ChatMessageId),
        created_at: row.get(2)?,
    })
}

fn select(conn: &Connection, id: i64) -> rusqlite::Result<Option<MessageIdentity>> {
    conn.query_row(
        "SELECT tracked_object_id, chat_message_id, created_at
         FROM message_identities WHERE tracked_object_id = ?1",
        params![id],
        from_row,
    )
    .optional()
}

pub async fn get(
    db: &Database,
    tracked_object_id: TrackedObjectId,
) -> Result<Option<MessageIdentity>, RelayError> {
    db.connection()
        .call(move |conn| select(conn, tracked_object_id.0))
        .await
        .map_err(map_tr_err)
}

/// Tries to insert a claim row for `tracked_object_id`.
///
/// A claim older than `claim_ttl_secs` that never got a message id is removed
/// first, in the same transaction.
pub async fn claim(
    db: &Database,
    tracked_object_id: TrackedObjectId,
    claim_ttl_secs: u64,
) -> Result<ClaimOutcome, RelayError> {
    let id = tracked_object_id.0;
    let modifier = seconds_ago(claim_ttl_secs);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let reaped = tx.execute(
                "DELETE FROM message_identities
                 WHERE tracked_object_id = ?1 AND chat_message_id IS NULL
                   AND created_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2)",
                params![id, modifier],
            )?;
            if reaped > 0 {
                tracing::warn!(tracked_object_id = id, "replacing abandoned message claim");
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO message_identities (tracked_object_id) VALUES (?1)",
                params![id],
            )?;
            let outcome = if inserted == 1 {
                ClaimOutcome::Claimed
            } else {
                match select(&tx, id)? {
                    Some(identity) => ClaimOutcome::Taken(identity),
                    // The conflicting row cannot vanish inside this transaction.
                    None => return Err(rusqlite::Error::QueryReturnedNoRows),
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}

/// Stores the sent message id on the claim (recreating the row if a reaper
/// removed it meanwhile).
pub async fn record(
    db: &Database,
    tracked_object_id: TrackedObjectId,
    chat_message_id: ChatMessageId,
) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_identities (tracked_object_id, chat_message_id)
                 VALUES (?1, ?2)
                 ON CONFLICT (tracked_object_id)
                 DO UPDATE SET chat_message_id = excluded.chat_message_id",
                params![tracked_object_id.0, chat_message_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes the identity; with `expected`, only if it still points at that message.
pub async fn delete(
    db: &Database,
    tracked_object_id: TrackedObjectId,
    expected: Option<ChatMessageId>,
) -> Result<bool, RelayError> {
    db.connection()
        .call(move |conn| {
            let deleted = match expected {
                Some(message_id) => conn.execute(
                    "DELETE FROM message_identities
                     WHERE tracked_object_id = ?1 AND chat_message_id = ?2",
                    params![tracked_object_id.0, message_id.0],
                )?,
                None => conn.execute(
                    "DELETE FROM message_identities WHERE tracked_object_id = ?1",
                    params![tracked_object_id.0],
                )?,
            };
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes claims that never received a message id within `claim_ttl_secs`.
pub async fn delete_abandoned(db: &Database, claim_ttl_secs: u64) -> Result<usize, RelayError> {
    let modifier = seconds_ago(claim_ttl_secs);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM message_identities
                 WHERE chat_message_id IS NULL
                   AND created_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
                params![modifier],
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{subscriptions, tracked};
    use octorelay_core::types::{ChatId, NewSubscription, NewTrackedObject, TrackedKind};
    use tempfile::tempdir;

    async fn setup() -> (Database, TrackedObjectId, tempfile::TempDir) {
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
        let obj = tracked::upsert(
            &db,
            &NewTrackedObject {
                subscription_id: sub.id,
                kind: TrackedKind::Issue,
                external_id: "1".into(),
                group_key: None,
                info: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
        (db, obj.id, dir)
    }

    async fn age_claim(db: &Database, id: TrackedObjectId) {
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE message_identities SET created_at = '2000-01-01T00:00:00.000Z'
                     WHERE tracked_object_id = ?1",
                    params![id.0],
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn second_claim_sees_the_first() {
        let (db, id, _dir) = setup().await;

        assert_eq!(claim(&db, id, 60).await.unwrap(), ClaimOutcome::Claimed);
        match claim(&db, id, 60).await.unwrap() {
            ClaimOutcome::Taken(identity) => assert!(identity.chat_message_id.is_none()),
            other => panic!("expected Taken, got {other:?}"),
        }

        record(&db, id, ChatMessageId(55)).await.unwrap();
        match claim(&db, id, 60).await.unwrap() {
            ClaimOutcome::Taken(identity) => {
                assert_eq!(identity.chat_message_id, Some(ChatMessageId(55)))
            }
            other => panic!("expected Taken, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn abandoned_claim_is_replaced() {
        let (db, id, _dir) = setup().await;
        claim(&db, id, 60).await.unwrap();
        age_claim(&db, id).await;

        assert_eq!(claim(&db, id, 60).await.unwrap(), ClaimOutcome::Claimed);
    }

    #[tokio::test]
    async fn recorded_identity_is_never_reaped() {
        let (db, id, _dir) = setup().await;
        claim(&db, id, 60).await.unwrap();
        record(&db, id, ChatMessageId(9)).await.unwrap();
        age_claim(&db, id).await;

        assert!(matches!(claim(&db, id, 60).await.unwrap(), ClaimOutcome::Taken(_)));
        assert_eq!(delete_abandoned(&db, 60).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_abandoned_removes_old_claims_only() {
        let (db, id, _dir) = setup().await;
        claim(&db, id, 60).await.unwrap();
        assert_eq!(delete_abandoned(&db, 60).await.unwrap(), 0);

        age_claim(&db, id).await;
        assert_eq!(delete_abandoned(&db, 60).await.unwrap(), 1);
        assert!(get(&db, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_delete_checks_message_id() {
        let (db, id, _dir) = setup().await;
        record(&db, id, ChatMessageId(3)).await.unwrap();

        assert!(!delete(&db, id, Some(ChatMessageId(4))).await.unwrap());
        assert!(get(&db, id).await.unwrap().is_some());
        assert!(delete(&db, id, Some(ChatMessageId(3))).await.unwrap());
        assert!(!delete(&db, id, None).await.unwrap());
    }
}
