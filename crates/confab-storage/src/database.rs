// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Query modules accept `&Database` and go through `connection().call()`.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::debug;

use confab_core::ConfabError;

use crate::migrations;

/// Convert a tokio-rusqlite error into ConfabError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ConfabError {
    ConfabError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database.
///
/// Owns the single tokio-rusqlite connection. Opening the database creates
/// parent directories, applies PRAGMAs, and runs any pending migrations.
#[derive(Debug)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` and bring the schema up to date.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ConfabError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;
        }

        // open() surfaces rusqlite's error directly, not the wrapped kind.
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;

        // journal_mode returns a row, so execute_batch rather than execute.
        let journal = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal};
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;"
        );
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;

        debug!(path = %path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), ConfabError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}
