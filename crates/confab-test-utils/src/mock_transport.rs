// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter for deterministic testing.
//!
//! `MockTransport` implements `TransportAdapter` with injectable inbound
//! events and captured outbound messages, deletes, and file fetches for
//! assertion in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use confab_core::types::{
    AdapterType, FileRef, HealthStatus, InboundEvent, MessageRef, OutboundMessage,
};
use confab_core::{ConfabError, PluginAdapter, TransportAdapter};

/// A mock messaging transport for testing.
///
/// Provides the queues tests need on both sides of the seam:
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured, each assigned an
///   increasing `out-{n}` ref
/// - **deleted**: every `delete()` call is recorded; refs marked via
///   `mark_gone()` report `Ok(false)` like an already-removed message
/// - **files**: blobs registered via `put_file()` are served by `fetch_file()`
pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    notify: Arc<Notify>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    deleted: Arc<Mutex<Vec<(String, MessageRef)>>>,
    gone: Arc<Mutex<Vec<MessageRef>>>,
    files: Arc<Mutex<HashMap<FileRef, Vec<u8>>>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
    next_ref: AtomicU64,
}

impl MockTransport {
    /// Create a new mock transport with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            gone: Arc::new(Mutex::new(Vec::new())),
            files: Arc::new(Mutex::new(HashMap::new())),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            next_ref: AtomicU64::new(0),
        }
    }

    /// Inject an inbound event; the next `receive()` returns it.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// All messages captured by `send()` so far, in send order.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Every `(user_id, ref)` pair `delete()` was called with.
    pub async fn deleted_refs(&self) -> Vec<(String, MessageRef)> {
        self.deleted.lock().await.clone()
    }

    /// Mark a ref as already gone: deleting it reports `Ok(false)`.
    pub async fn mark_gone(&self, message: MessageRef) {
        self.gone.lock().await.push(message);
    }

    /// Register a file blob that `fetch_file()` will serve.
    pub async fn put_file(&self, file: FileRef, bytes: Vec<u8>) {
        self.files.lock().await.insert(file, bytes);
    }

    /// Make every subsequent `send()` fail with a transport error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// End the inbound stream: `receive()` drains what is already queued,
    /// then reports the transport as closed.
    pub fn close_inbound(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for MockTransport {
    async fn connect(&mut self) -> Result<(), ConfabError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, ConfabError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ConfabError::Transport {
                message: "mock send failure".to_string(),
                source: None,
            });
        }
        let n = self.next_ref.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(msg);
        Ok(MessageRef(format!("out-{n}")))
    }

    async fn delete(&self, user_id: &str, message: &MessageRef) -> Result<bool, ConfabError> {
        self.deleted
            .lock()
            .await
            .push((user_id.to_string(), message.clone()));
        if self.gone.lock().await.contains(message) {
            return Ok(false);
        }
        Ok(true)
    }

    async fn fetch_file(&self, file: &FileRef) -> Result<Vec<u8>, ConfabError> {
        self.files
            .lock()
            .await
            .get(file)
            .cloned()
            .ok_or_else(|| ConfabError::Transport {
                message: format!("no such file: {file}"),
                source: None,
            })
    }

    async fn receive(&self) -> Result<InboundEvent, ConfabError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(ConfabError::TransportClosed);
                }
            }
            // Wait for notification that a new event was injected.
            self.notify.notified().await;
        }
    }
}
