// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit ledger for per-user balances in SQLite.
//!
//! Balances live in the `balance` column of the `users` table. The consume
//! path is a single conditional UPDATE, so two concurrent turns can never
//! drive a balance below zero. Every confirmed payment also writes an audit
//! row to the `payments` table in the same transaction that grants credit.

use confab_core::ConfabError;
use rusqlite::params;
use tracing::info;

/// Convert a tokio-rusqlite error into ConfabError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ConfabError {
    ConfabError::Storage {
        source: Box::new(e),
    }
}

/// Persistent credit ledger backed by SQLite.
///
/// The `users` and `payments` tables must already exist (created by storage
/// migrations). All operations go through the single tokio-rusqlite
/// background thread.
pub struct CreditLedger {
    conn: tokio_rusqlite::Connection,
}

impl CreditLedger {
    /// Create a new credit ledger using the given tokio-rusqlite connection.
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Open a credit ledger from a database file path.
    ///
    /// Creates its own tokio-rusqlite connection to the given path.
    pub async fn open(path: &str) -> Result<Self, ConfabError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self::new(conn))
    }

    /// Check that a user can afford `cost` units without charging them.
    ///
    /// A user with no row counts as a zero balance. Returns
    /// [`ConfabError::InsufficientCredit`] when the balance is short.
    pub async fn authorize(&self, user_id: &str, cost: i64) -> Result<(), ConfabError> {
        let available = self.balance(user_id).await?;
        if available < cost {
            return Err(ConfabError::InsufficientCredit {
                required: cost,
                available,
            });
        }
        Ok(())
    }

    /// Atomically deduct `cost` units from a user's balance.
    ///
    /// The deduction only happens when the balance covers the full cost;
    /// otherwise nothing changes and [`ConfabError::InsufficientCredit`] is
    /// returned. `cost` must be positive. Returns the remaining balance.
    pub async fn consume(&self, user_id: &str, cost: i64) -> Result<i64, ConfabError> {
        let user_id_owned = user_id.to_string();
        let outcome = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET balance = balance - ?1,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE user_id = ?2 AND balance >= ?1",
                    params![cost, user_id_owned],
                )?;
                if updated == 0 {
                    let available: i64 = conn.query_row(
                        "SELECT COALESCE((SELECT balance FROM users WHERE user_id = ?1), 0)",
                        params![user_id_owned],
                        |row| row.get(0),
                    )?;
                    return Ok(Err(available));
                }
                let remaining: i64 = conn.query_row(
                    "SELECT balance FROM users WHERE user_id = ?1",
                    params![user_id_owned],
                    |row| row.get(0),
                )?;
                Ok(Ok(remaining))
            })
            .await
            .map_err(map_tr_err)?;

        match outcome {
            Ok(remaining) => {
                info!(user_id = %user_id, cost, remaining, "credit consumed");
                Ok(remaining)
            }
            Err(available) => Err(ConfabError::InsufficientCredit {
                required: cost,
                available,
            }),
        }
    }

    /// Grant `units` of credit for a confirmed payment.
    ///
    /// Upserts the user row, increments the balance, and records the payment
    /// in the audit table, all in one transaction. Returns the new balance.
    pub async fn credit(
        &self,
        user_id: &str,
        amount_minor: i64,
        currency: &str,
        units: i64,
    ) -> Result<i64, ConfabError> {
        let user_id_owned = user_id.to_string();
        let currency_owned = currency.to_string();
        let payment_id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();

        let balance = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO users (user_id, first_name, balance)
                     VALUES (?1, '', ?2)
                     ON CONFLICT(user_id) DO UPDATE SET
                         balance = balance + excluded.balance,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![user_id_owned, units],
                )?;
                tx.execute(
                    "INSERT INTO payments (id, user_id, amount_minor, currency, credited, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        payment_id,
                        user_id_owned,
                        amount_minor,
                        currency_owned,
                        units,
                        created_at,
                    ],
                )?;
                let balance: i64 = tx.query_row(
                    "SELECT balance FROM users WHERE user_id = ?1",
                    params![user_id_owned],
                    |row| row.get(0),
                )?;
                tx.commit()?;
                Ok(balance)
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            user_id = %user_id,
            amount_minor,
            currency = %currency,
            credited = units,
            balance,
            "payment credited"
        );

        Ok(balance)
    }

    /// A user's current balance. Users with no row have a zero balance.
    pub async fn balance(&self, user_id: &str) -> Result<i64, ConfabError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let balance: i64 = conn.query_row(
                    "SELECT COALESCE((SELECT balance FROM users WHERE user_id = ?1), 0)",
                    params![user_id],
                    |row| row.get(0),
                )?;
                Ok(balance)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Create an in-memory database with the users and payments schema applied.
    async fn test_db() -> tokio_rusqlite::Connection {
        let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "CREATE TABLE users (
                    user_id TEXT PRIMARY KEY NOT NULL,
                    first_name TEXT NOT NULL,
                    last_name TEXT,
                    balance INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                );
                CREATE TABLE payments (
                    id TEXT PRIMARY KEY NOT NULL,
                    user_id TEXT NOT NULL,
                    amount_minor INTEGER NOT NULL,
                    currency TEXT NOT NULL,
                    credited INTEGER NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                );",
            )?;
            Ok(())
        })
        .await
        .unwrap();
        conn
    }

    async fn seed_user(conn: &tokio_rusqlite::Connection, user_id: &str, balance: i64) {
        let user_id = user_id.to_string();
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO users (user_id, first_name, balance) VALUES (?1, 'Test', ?2)",
                params![user_id, balance],
            )?;
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn balance_of_unknown_user_is_zero() {
        let ledger = CreditLedger::new(test_db().await);
        assert_eq!(ledger.balance("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn authorize_passes_with_sufficient_balance() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 5).await;
        let ledger = CreditLedger::new(conn);

        ledger.authorize("u1", 5).await.unwrap();
        ledger.authorize("u1", 1).await.unwrap();
    }

    #[tokio::test]
    async fn authorize_rejects_short_balance() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 2).await;
        let ledger = CreditLedger::new(conn);

        let err = ledger.authorize("u1", 3).await.unwrap_err();
        match err {
            ConfabError::InsufficientCredit {
                required,
                available,
            } => {
                assert_eq!(required, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientCredit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn authorize_rejects_unknown_user() {
        let ledger = CreditLedger::new(test_db().await);
        let err = ledger.authorize("ghost", 1).await.unwrap_err();
        assert!(matches!(
            err,
            ConfabError::InsufficientCredit {
                required: 1,
                available: 0
            }
        ));
    }

    #[tokio::test]
    async fn authorize_does_not_change_balance() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 5).await;
        let ledger = CreditLedger::new(conn);

        ledger.authorize("u1", 3).await.unwrap();
        assert_eq!(ledger.balance("u1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn consume_deducts_and_returns_remaining() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 5).await;
        let ledger = CreditLedger::new(conn);

        let remaining = ledger.consume("u1", 2).await.unwrap();
        assert_eq!(remaining, 3);
        assert_eq!(ledger.balance("u1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn consume_exact_balance_leaves_zero() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 4).await;
        let ledger = CreditLedger::new(conn);

        let remaining = ledger.consume("u1", 4).await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn consume_short_balance_changes_nothing() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 2).await;
        let ledger = CreditLedger::new(conn);

        let err = ledger.consume("u1", 3).await.unwrap_err();
        assert!(matches!(
            err,
            ConfabError::InsufficientCredit {
                required: 3,
                available: 2
            }
        ));
        assert_eq!(ledger.balance("u1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_consumes_never_overdraw() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 5).await;
        let ledger = Arc::new(CreditLedger::new(conn));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(
                async move { ledger.consume("u1", 1).await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 5, "exactly the funded turns should succeed");
        assert_eq!(ledger.balance("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn credit_creates_user_row_when_missing() {
        let ledger = CreditLedger::new(test_db().await);

        let balance = ledger.credit("new-user", 1000, "USD", 10).await.unwrap();
        assert_eq!(balance, 10);
        assert_eq!(ledger.balance("new-user").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn credit_accumulates_on_existing_balance() {
        let conn = test_db().await;
        seed_user(&conn, "u1", 3).await;
        let ledger = CreditLedger::new(conn);

        let balance = ledger.credit("u1", 2000, "USD", 20).await.unwrap();
        assert_eq!(balance, 23);
    }

    #[tokio::test]
    async fn credit_writes_audit_row() {
        let ledger = CreditLedger::new(test_db().await);
        ledger.credit("u1", 1500, "EUR", 15).await.unwrap();

        let (amount_minor, currency, credited): (i64, String, i64) = ledger
            .conn
            .call(|conn| {
                conn.query_row(
                    "SELECT amount_minor, currency, credited FROM payments WHERE user_id = 'u1'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
            })
            .await
            .unwrap();

        assert_eq!(amount_minor, 1500);
        assert_eq!(currency, "EUR");
        assert_eq!(credited, 15);
    }

    #[tokio::test]
    async fn credit_then_consume_roundtrip() {
        let ledger = CreditLedger::new(test_db().await);

        ledger.credit("u1", 1000, "USD", 2).await.unwrap();
        ledger.consume("u1", 1).await.unwrap();
        ledger.consume("u1", 1).await.unwrap();
        let err = ledger.consume("u1", 1).await.unwrap_err();
        assert!(matches!(err, ConfabError::InsufficientCredit { .. }));
    }
}
