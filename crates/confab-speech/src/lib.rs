// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice transcription adapter for the Confab assistant.
//!
//! Implements [`TranscriberAdapter`] over an OpenAI-compatible
//! transcription HTTP service.

pub mod client;

use async_trait::async_trait;

use confab_config::model::SpeechConfig;
use confab_core::{AdapterType, ConfabError, HealthStatus, PluginAdapter, TranscriberAdapter};

pub use client::SpeechClient;

/// Transcriber adapter backed by the speech HTTP service.
pub struct SpeechTranscriber {
    client: SpeechClient,
}

impl SpeechTranscriber {
    /// Creates the transcriber from the `[speech]` config section.
    ///
    /// Fails with [`ConfabError::Config`] when no API key can be resolved.
    pub fn new(config: &SpeechConfig) -> Result<Self, ConfabError> {
        let client = SpeechClient::new(config)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for SpeechTranscriber {
    fn name(&self) -> &str {
        "speech"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transcriber
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        let probe = reqwest::Client::new()
            .head(self.client.endpoint())
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await;
        match probe {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "speech endpoint unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        Ok(())
    }
}

#[async_trait]
impl TranscriberAdapter for SpeechTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ConfabError> {
        self.client.transcribe(audio).await
    }
}
