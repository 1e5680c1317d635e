// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Confab integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock messaging transport with event injection and capture
//! - [`MockResponder`] - Mock reply generator with scripted replies
//! - [`MockTranscriber`] - Mock speech-to-text with scripted transcripts
//! - [`FlakyHistory`] - History wrapper with injectable write failures
//! - [`TestHarness`] - A full pipeline over mocks and a temp database

pub mod harness;
pub mod mock_history;
pub mod mock_responder;
pub mod mock_transcriber;
pub mod mock_transport;

pub use harness::TestHarness;
pub use mock_history::FlakyHistory;
pub use mock_responder::MockResponder;
pub use mock_transcriber::MockTranscriber;
pub use mock_transport::MockTransport;
