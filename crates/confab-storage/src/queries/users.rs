// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile operations.

use confab_core::ConfabError;
use rusqlite::params;

use crate::database::Database;
use crate::models::UserProfile;

/// Insert a user or refresh their display names.
///
/// The credit balance is owned by the credit ledger and is never touched
/// here; re-upserting an existing user only updates the name columns.
pub async fn upsert_user(db: &Database, user: &UserProfile) -> Result<(), ConfabError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, first_name, last_name)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     first_name = excluded.first_name,
                     last_name = excluded.last_name,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![user.user_id, user.first_name, user.last_name],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user's profile by ID.
pub async fn get_user(db: &Database, user_id: &str) -> Result<Option<UserProfile>, ConfabError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, first_name, last_name FROM users WHERE user_id = ?1",
            )?;
            let result = stmt.query_row(params![user_id], |row| {
                Ok(UserProfile {
                    user_id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                })
            });
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
