// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{FileRef, InboundEvent, MessageRef, OutboundMessage};

/// Adapter for the bidirectional messaging surface.
///
/// A transport turns platform updates into [`InboundEvent`]s and carries
/// outbound replies, deletes, and file fetches. Message and file refs are
/// opaque outside the transport that issued them.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    /// Establishes the platform connection and starts receiving updates.
    async fn connect(&mut self) -> Result<(), ConfabError>;

    /// Sends a message; `msg.reply_to` threads it under an earlier message.
    /// Returns the ref of the posted message.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, ConfabError>;

    /// Deletes a previously posted or received message, best-effort.
    ///
    /// `Ok(false)` means the platform reports the message already gone or
    /// not deletable; only transport faults are errors.
    async fn delete(&self, user_id: &str, message: &MessageRef) -> Result<bool, ConfabError>;

    /// Downloads a file (voice note) the platform referenced.
    async fn fetch_file(&self, file: &FileRef) -> Result<Vec<u8>, ConfabError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, ConfabError>;
}
