// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcriber adapter trait for speech-to-text services.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for turning voice note audio into text.
#[async_trait]
pub trait TranscriberAdapter: PluginAdapter {
    /// Transcribes the given audio bytes.
    ///
    /// The bytes are passed through as received from the transport; codec
    /// handling is the service's concern. Failures surface as
    /// [`ConfabError::Transcription`].
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ConfabError>;
}
