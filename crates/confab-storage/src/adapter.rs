// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the HistoryAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use confab_config::model::StorageConfig;
use confab_core::types::{Turn, UserProfile};
use confab_core::{AdapterType, ConfabError, HealthStatus, HistoryAdapter, PluginAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed history adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`HistoryAdapter::initialize`].
pub struct SqliteHistory {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteHistory {
    /// Create a new SqliteHistory with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ConfabError> {
        self.db.get().ok_or_else(|| ConfabError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteHistory {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryAdapter for SqliteHistory {
    async fn initialize(&self) -> Result<(), ConfabError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ConfabError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite history initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ConfabError> {
        let db = self.db()?;
        // Checkpoint WAL before close.
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn append(&self, turn: &Turn) -> Result<(), ConfabError> {
        queries::turns::append_turn(self.db()?, turn).await
    }

    async fn pop_last(&self, user_id: &str, count: u32) -> Result<usize, ConfabError> {
        queries::turns::delete_last_turns(self.db()?, user_id, count).await
    }

    async fn clear(&self, user_id: &str) -> Result<usize, ConfabError> {
        queries::turns::delete_all_turns(self.db()?, user_id).await
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<Turn>, ConfabError> {
        queries::turns::get_turns_for_user(self.db()?, user_id, None).await
    }

    async fn count(&self, user_id: &str) -> Result<i64, ConfabError> {
        queries::turns::count_turns(self.db()?, user_id).await
    }

    async fn upsert_user(&self, user: &UserProfile) -> Result<(), ConfabError> {
        queries::users::upsert_user(self.db()?, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn make_turn(user_id: &str, input: &str, output: &str) -> Turn {
        Turn {
            user_id: user_id.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_history_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(history.name(), "sqlite");
        assert_eq!(history.version(), semver::Version::new(0, 1, 0));
        assert_eq!(history.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));

        history.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));

        history.initialize().await.unwrap();
        let result = history.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));

        history.initialize().await.unwrap();
        let status = history.health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));

        let result = history.health_check().await;
        assert!(result.is_err(), "health_check should fail before initialize");
    }

    #[tokio::test]
    async fn full_history_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));
        history.initialize().await.unwrap();

        // Register the user.
        let user = UserProfile {
            user_id: "u1".to_string(),
            first_name: "Alice".to_string(),
            last_name: None,
        };
        history.upsert_user(&user).await.unwrap();

        // Append two exchanges.
        history
            .append(&make_turn("u1", "hello", "hi there"))
            .await
            .unwrap();
        history
            .append(&make_turn("u1", "what's up?", "not much"))
            .await
            .unwrap();

        let turns = history.read_all("u1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].input, "hello");
        assert_eq!(turns[1].output, "not much");

        // Undo the most recent exchange.
        let deleted = history.pop_last("u1", 1).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(history.count("u1").await.unwrap(), 1);

        // Wipe everything.
        let cleared = history.clear("u1").await.unwrap();
        assert_eq!(cleared, 1);
        assert_eq!(history.count("u1").await.unwrap(), 0);

        history.close().await.unwrap();
    }

    #[tokio::test]
    async fn users_histories_are_isolated() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("isolation.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));
        history.initialize().await.unwrap();

        history.append(&make_turn("u1", "a", "b")).await.unwrap();
        history.append(&make_turn("u2", "c", "d")).await.unwrap();

        history.clear("u1").await.unwrap();

        assert_eq!(history.count("u1").await.unwrap(), 0);
        assert_eq!(history.count("u2").await.unwrap(), 1);

        history.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_appends_all_land() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("concurrent.db");
        let history = Arc::new(SqliteHistory::new(make_config(db_path.to_str().unwrap())));
        history.initialize().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let history = Arc::clone(&history);
            handles.push(tokio::spawn(async move {
                history
                    .append(&make_turn("u1", &format!("msg {i}"), &format!("reply {i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(history.count("u1").await.unwrap(), 10);
        history.close().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let history = SqliteHistory::new(make_config(db_path.to_str().unwrap()));
        history.initialize().await.unwrap();

        history.append(&make_turn("u1", "a", "b")).await.unwrap();

        // Shutdown should succeed.
        history.shutdown().await.unwrap();
    }
}
