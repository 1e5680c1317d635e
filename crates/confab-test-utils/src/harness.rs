// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles a complete turn pipeline with mock adapters and
//! a temp SQLite database. Tests drive it through `process()` or the
//! command handlers and assert against the mocks, the history store, and
//! the ledger.

use std::sync::Arc;

use confab_agent::turn::{TurnContext, TurnProcessor};
use confab_agent::SessionRegistry;
use confab_config::model::{CreditConfig, PaymentsConfig, QuotaUnit, StorageConfig};
use confab_core::types::{
    FileRef, InboundContent, InboundEvent, MessageRef, UserProfile, now_rfc3339,
};
use confab_core::{
    ConfabError, HistoryAdapter, ResponderAdapter, TranscriberAdapter, TransportAdapter,
};
use confab_credit::{CreditLedger, QuotaPolicy};
use confab_storage::SqliteHistory;

use crate::mock_history::FlakyHistory;
use crate::mock_responder::MockResponder;
use crate::mock_transcriber::MockTranscriber;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    free_mode: bool,
    cost_per_turn: i64,
    units_per_dollar: i64,
    provider_token: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            free_mode: true,
            cost_per_turn: 1,
            units_per_dollar: 1,
            provider_token: None,
        }
    }

    /// Pre-load mock responder replies.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    /// Enable credit gating with the given cost per turn.
    pub fn metered(mut self, cost_per_turn: i64) -> Self {
        self.free_mode = false;
        self.cost_per_turn = cost_per_turn;
        self
    }

    /// Set the credit units granted per dollar paid.
    pub fn with_units_per_dollar(mut self, units: i64) -> Self {
        self.units_per_dollar = units;
        self
    }

    /// Set a payments provider token, enabling the deposit flow.
    pub fn with_provider_token(mut self, token: &str) -> Self {
        self.provider_token = Some(token.to_string());
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ConfabError> {
        // Temp directory for SQLite; dropped with the harness.
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ConfabError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let storage_config = StorageConfig {
            database_path: db_path_str.clone(),
            wal_mode: true,
        };
        let history = Arc::new(SqliteHistory::new(storage_config));
        history.initialize().await?;

        // The pipeline writes through a fault-injectable wrapper; tests
        // assert against the real store underneath.
        let history_faults = Arc::new(FlakyHistory::new(
            Arc::clone(&history) as Arc<dyn HistoryAdapter>
        ));

        // Ledger on the same database the history migrated.
        let ledger = Arc::new(CreditLedger::open(&db_path_str).await?);

        let credit_config = CreditConfig {
            free_mode: self.free_mode,
            cost_per_turn: self.cost_per_turn,
            quota_unit: QuotaUnit::Minute,
            units_per_dollar: self.units_per_dollar,
        };
        let quota = QuotaPolicy::new(&credit_config);

        let payments = PaymentsConfig {
            provider_token: self.provider_token,
            ..PaymentsConfig::default()
        };

        let transport = Arc::new(MockTransport::new());
        let responder = Arc::new(if self.replies.is_empty() {
            MockResponder::new()
        } else {
            MockResponder::with_replies(self.replies)
        });
        let transcriber = Arc::new(MockTranscriber::new());

        let ctx = Arc::new(TurnContext {
            transport: Arc::clone(&transport) as Arc<dyn TransportAdapter>,
            responder: Arc::clone(&responder) as Arc<dyn ResponderAdapter>,
            transcriber: Some(Arc::clone(&transcriber) as Arc<dyn TranscriberAdapter>),
            history: Arc::clone(&history_faults) as Arc<dyn HistoryAdapter>,
            ledger: Arc::clone(&ledger),
            quota,
            registry: SessionRegistry::new(),
            payments,
        });

        Ok(TestHarness {
            transport,
            responder,
            transcriber,
            history,
            history_faults,
            ledger,
            ctx,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock transport adapter.
    pub transport: Arc<MockTransport>,
    /// The mock responder adapter.
    pub responder: Arc<MockResponder>,
    /// The mock transcriber adapter.
    pub transcriber: Arc<MockTranscriber>,
    /// SQLite history store (temp DB, cleaned up on drop).
    pub history: Arc<SqliteHistory>,
    /// The fault-injectable wrapper the pipeline writes through.
    history_faults: Arc<FlakyHistory>,
    /// Credit ledger over the same database.
    pub ledger: Arc<CreditLedger>,
    /// The shared context the pipeline and command handlers run over.
    pub ctx: Arc<TurnContext>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A processor over this harness's context.
    pub fn processor(&self) -> TurnProcessor {
        TurnProcessor::new(Arc::clone(&self.ctx))
    }

    /// Make every subsequent history append fail with a storage error.
    pub fn fail_history_appends(&self, fail: bool) {
        self.history_faults.fail_appends(fail);
    }

    /// A text event from `user_id`, carried by message `msg_ref`.
    pub fn text_event(&self, user_id: &str, msg_ref: &str, text: &str) -> InboundEvent {
        InboundEvent {
            message: MessageRef(msg_ref.to_string()),
            user: profile(user_id),
            content: InboundContent::Text(text.to_string()),
            received_at: now_rfc3339(),
        }
    }

    /// A voice event referencing file `file_ref`.
    pub fn voice_event(&self, user_id: &str, msg_ref: &str, file_ref: &str) -> InboundEvent {
        InboundEvent {
            message: MessageRef(msg_ref.to_string()),
            user: profile(user_id),
            content: InboundContent::Voice {
                file: FileRef(file_ref.to_string()),
                duration_secs: Some(3),
            },
            received_at: now_rfc3339(),
        }
    }
}

fn profile(user_id: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        first_name: "Test".to_string(),
        last_name: None,
    }
}
