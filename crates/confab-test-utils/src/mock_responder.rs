// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock responder adapter for deterministic testing.
//!
//! `MockResponder` implements `ResponderAdapter` with pre-configured
//! replies, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use confab_core::types::{AdapterType, HealthStatus};
use confab_core::{ConfabError, PluginAdapter, ResponderAdapter};

/// One scripted `generate()` outcome.
enum Scripted {
    Reply(String),
    /// Reply delivered after a delay, for ordering tests.
    Delayed(String, Duration),
    Failure(String),
}

/// A mock responder that returns pre-configured replies.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, a
/// default "mock reply" text is returned. Every call is recorded as
/// `(user_id, text, display_name)` for assertion.
pub struct MockResponder {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl MockResponder {
    /// Create a new mock responder with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock responder pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<String>) -> Self {
        let responder = Self::new();
        let script = Arc::clone(&responder.script);
        let mut queue = script.try_lock().expect("fresh mutex");
        queue.extend(replies.into_iter().map(Scripted::Reply));
        drop(queue);
        responder
    }

    /// Queue a reply.
    pub async fn add_reply(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Reply(text.into()));
    }

    /// Queue a reply that takes `delay` to produce.
    pub async fn add_delayed_reply(&self, text: impl Into<String>, delay: Duration) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Delayed(text.into(), delay));
    }

    /// Queue a generation failure.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Failure(message.into()));
    }

    /// Every `(user_id, text, display_name)` triple `generate()` saw.
    pub async fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockResponder {
    fn name(&self) -> &str {
        "mock-responder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        Ok(())
    }
}

#[async_trait]
impl ResponderAdapter for MockResponder {
    async fn generate(
        &self,
        user_id: &str,
        text: &str,
        display_name: &str,
    ) -> Result<String, ConfabError> {
        self.calls.lock().await.push((
            user_id.to_string(),
            text.to_string(),
            display_name.to_string(),
        ));

        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Delayed(reply, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(reply)
            }
            Some(Scripted::Failure(message)) => Err(ConfabError::Generation {
                message,
                source: None,
            }),
            None => Ok("mock reply".to_string()),
        }
    }
}
