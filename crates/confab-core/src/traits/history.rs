// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History adapter trait for the durable per-user conversation log.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Turn, UserProfile};

/// Adapter for the append-only per-user turn log.
///
/// Every operation is keyed by user id; users never see each other's
/// turns. Any backend failure surfaces as [`ConfabError::Storage`] and
/// leaves previously committed turns intact.
#[async_trait]
pub trait HistoryAdapter: PluginAdapter {
    /// Initializes the backend (migrations, connections).
    async fn initialize(&self) -> Result<(), ConfabError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), ConfabError>;

    /// Appends one turn atomically.
    async fn append(&self, turn: &Turn) -> Result<(), ConfabError>;

    /// Removes up to `count` most-recent turns for the user and returns how
    /// many were removed. Fewer than `count` existing -- including none at
    /// all -- is a success, not an error.
    async fn pop_last(&self, user_id: &str, count: u32) -> Result<usize, ConfabError>;

    /// Removes every turn for the user; idempotent. Returns rows removed.
    async fn clear(&self, user_id: &str) -> Result<usize, ConfabError>;

    /// Returns the user's turns in insertion order.
    async fn read_all(&self, user_id: &str) -> Result<Vec<Turn>, ConfabError>;

    /// Returns the number of turns stored for the user.
    async fn count(&self, user_id: &str) -> Result<i64, ConfabError>;

    /// Creates or refreshes the user row (names, last-seen); never touches
    /// the balance column.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), ConfabError>;
}
