// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History wrapper that injects write failures on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use confab_core::types::{AdapterType, HealthStatus, Turn, UserProfile};
use confab_core::{ConfabError, HistoryAdapter, PluginAdapter};

/// Wraps a real history store and fails `append()` when told to.
///
/// Everything else passes straight through, so a test can take the write
/// path down mid-pipeline and still assert against the underlying store.
pub struct FlakyHistory {
    inner: Arc<dyn HistoryAdapter>,
    fail_appends: AtomicBool,
}

impl FlakyHistory {
    /// Wrap an existing history store.
    pub fn new(inner: Arc<dyn HistoryAdapter>) -> Self {
        Self {
            inner,
            fail_appends: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `append()` fail with a storage error.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for FlakyHistory {
    fn name(&self) -> &str {
        "flaky-history"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl HistoryAdapter for FlakyHistory {
    async fn initialize(&self) -> Result<(), ConfabError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), ConfabError> {
        self.inner.close().await
    }

    async fn append(&self, turn: &Turn) -> Result<(), ConfabError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(ConfabError::Storage {
                source: "history append unavailable".into(),
            });
        }
        self.inner.append(turn).await
    }

    async fn pop_last(&self, user_id: &str, count: u32) -> Result<usize, ConfabError> {
        self.inner.pop_last(user_id, count).await
    }

    async fn clear(&self, user_id: &str) -> Result<usize, ConfabError> {
        self.inner.clear(user_id).await
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<Turn>, ConfabError> {
        self.inner.read_all(user_id).await
    }

    async fn count(&self, user_id: &str) -> Result<i64, ConfabError> {
        self.inner.count(user_id).await
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), ConfabError> {
        self.inner.upsert_user(profile).await
    }
}
