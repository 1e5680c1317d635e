// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transcriber adapter for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use confab_core::types::{AdapterType, HealthStatus};
use confab_core::{ConfabError, PluginAdapter, TranscriberAdapter};

/// A mock transcriber that returns pre-configured transcripts.
///
/// Outcomes are popped from a FIFO queue; an empty queue yields a default
/// "mock transcript".
pub struct MockTranscriber {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: AtomicUsize,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful transcript.
    pub async fn add_transcript(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a transcription failure.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Err(message.into()));
    }

    /// How many times `transcribe()` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transcriber
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        Ok(())
    }
}

#[async_trait]
impl TranscriberAdapter for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, ConfabError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ConfabError::Transcription {
                message,
                source: None,
            }),
            None => Ok("mock transcript".to_string()),
        }
    }
}
