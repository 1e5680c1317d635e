// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn operations.
//!
//! Turns are append-only rows ordered by the AUTOINCREMENT `id` column.
//! Undo deletes the most recent rows for a user; the id never recycles,
//! so ordering stays stable across deletions.

use confab_core::ConfabError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Turn;

/// Append one completed exchange to a user's history.
pub async fn append_turn(db: &Database, turn: &Turn) -> Result<(), ConfabError> {
    let turn = turn.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO turns (user_id, input, output, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![turn.user_id, turn.input, turn.output, turn.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete the `count` most recent turns for a user.
///
/// Returns the number of rows actually deleted, which is less than `count`
/// when the history is shorter. Deleting from an empty history is a no-op.
pub async fn delete_last_turns(
    db: &Database,
    user_id: &str,
    count: u32,
) -> Result<usize, ConfabError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM turns WHERE id IN (
                     SELECT id FROM turns WHERE user_id = ?1
                     ORDER BY id DESC LIMIT ?2
                 )",
                params![user_id, count],
            )?;
            Ok(deleted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete every turn for a user. Returns the number of rows deleted.
pub async fn delete_all_turns(db: &Database, user_id: &str) -> Result<usize, ConfabError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM turns WHERE user_id = ?1", params![user_id])?;
            Ok(deleted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user's turns in chronological order.
pub async fn get_turns_for_user(
    db: &Database,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Turn>, ConfabError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut turns = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(
                        "SELECT user_id, input, output, created_at
                         FROM turns WHERE user_id = ?1
                         ORDER BY id ASC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![user_id, lim], |row| {
                        Ok(Turn {
                            user_id: row.get(0)?,
                            input: row.get(1)?,
                            output: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    })?;
                    for row in rows {
                        turns.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT user_id, input, output, created_at
                         FROM turns WHERE user_id = ?1
                         ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![user_id], |row| {
                        Ok(Turn {
                            user_id: row.get(0)?,
                            input: row.get(1)?,
                            output: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    })?;
                    for row in rows {
                        turns.push(row?);
                    }
                }
            }
            Ok(turns)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count a user's stored turns.
pub async fn count_turns(db: &Database, user_id: &str) -> Result<i64, ConfabError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM turns WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn make_turn(user_id: &str, input: &str, output: &str, timestamp: &str) -> Turn {
        Turn {
            user_id: user_id.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            created_at: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn append_and_read_in_order() {
        let (db, _dir) = setup_db().await;

        let t1 = make_turn("u1", "hello", "hi there", "2026-01-01T00:00:01.000Z");
        let t2 = make_turn("u1", "how are you?", "fine", "2026-01-01T00:00:02.000Z");
        let t3 = make_turn("u1", "bye", "see you", "2026-01-01T00:00:03.000Z");

        append_turn(&db, &t1).await.unwrap();
        append_turn(&db, &t2).await.unwrap();
        append_turn(&db, &t3).await.unwrap();

        let turns = get_turns_for_user(&db, "u1", None).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].input, "hello");
        assert_eq!(turns[1].input, "how are you?");
        assert_eq!(turns[2].input, "bye");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn read_with_limit() {
        let (db, _dir) = setup_db().await;

        for i in 0..5 {
            let turn = make_turn(
                "u1",
                &format!("msg {i}"),
                &format!("reply {i}"),
                &format!("2026-01-01T00:00:0{i}.000Z"),
            );
            append_turn(&db, &turn).await.unwrap();
        }

        let turns = get_turns_for_user(&db, "u1", Some(3)).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].input, "msg 0");
        assert_eq!(turns[2].input, "msg 2");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_last_removes_most_recent() {
        let (db, _dir) = setup_db().await;

        for i in 0..4 {
            let turn = make_turn(
                "u1",
                &format!("msg {i}"),
                &format!("reply {i}"),
                &format!("2026-01-01T00:00:0{i}.000Z"),
            );
            append_turn(&db, &turn).await.unwrap();
        }

        let deleted = delete_last_turns(&db, "u1", 1).await.unwrap();
        assert_eq!(deleted, 1);

        let turns = get_turns_for_user(&db, "u1", None).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns.last().unwrap().input, "msg 2");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_last_on_empty_history_is_noop() {
        let (db, _dir) = setup_db().await;

        let deleted = delete_last_turns(&db, "nobody", 1).await.unwrap();
        assert_eq!(deleted, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_last_clamps_to_available() {
        let (db, _dir) = setup_db().await;

        let turn = make_turn("u1", "only", "one", "2026-01-01T00:00:01.000Z");
        append_turn(&db, &turn).await.unwrap();

        let deleted = delete_last_turns(&db, "u1", 10).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(count_turns(&db, "u1").await.unwrap(), 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_all_clears_only_that_user() {
        let (db, _dir) = setup_db().await;

        append_turn(&db, &make_turn("u1", "a", "b", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        append_turn(&db, &make_turn("u1", "c", "d", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();
        append_turn(&db, &make_turn("u2", "e", "f", "2026-01-01T00:00:03.000Z"))
            .await
            .unwrap();

        let deleted = delete_all_turns(&db, "u1").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(count_turns(&db, "u1").await.unwrap(), 0);
        assert_eq!(count_turns(&db, "u2").await.unwrap(), 1);

        // Clearing again is a no-op.
        let deleted = delete_all_turns(&db, "u1").await.unwrap();
        assert_eq!(deleted, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ordering_survives_undo_then_append() {
        let (db, _dir) = setup_db().await;

        append_turn(&db, &make_turn("u1", "first", "1", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        append_turn(&db, &make_turn("u1", "second", "2", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();
        delete_last_turns(&db, "u1", 1).await.unwrap();
        append_turn(&db, &make_turn("u1", "third", "3", "2026-01-01T00:00:03.000Z"))
            .await
            .unwrap();

        let turns = get_turns_for_user(&db, "u1", None).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].input, "first");
        assert_eq!(turns[1].input, "third");

        db.close().await.unwrap();
    }
}
