// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the transcription service.
//!
//! Speaks the OpenAI-compatible `/audio/transcriptions` shape: a multipart
//! upload with a `file` part and a `model` field, answered by
//! `{"text": "..."}`.

use std::time::Duration;

use confab_config::model::SpeechConfig;
use confab_core::ConfabError;
use serde::Deserialize;
use tracing::{debug, warn};

/// Response body returned by the transcription endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for the speech-to-text service.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl SpeechClient {
    /// Creates a new speech client from the `[speech]` config section.
    ///
    /// The API key is resolved from config first, then the
    /// `CONFAB_SPEECH_API_KEY` environment variable; with neither present
    /// construction fails.
    pub fn new(config: &SpeechConfig) -> Result<Self, ConfabError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("CONFAB_SPEECH_API_KEY").ok())
            .ok_or_else(|| {
                ConfabError::Config(
                    "speech API key required: set speech.api_key or CONFAB_SPEECH_API_KEY".into(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfabError::Transcription {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_retries: 1,
        })
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Transcribes the given audio bytes.
    ///
    /// The bytes are uploaded as received from the transport; codec
    /// handling is the service's concern. On transient errors (429, 5xx),
    /// retries once after a 1-second delay.
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String, ConfabError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying transcription after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            // reqwest consumes the form per request, so it is rebuilt on retry.
            let file_part = reqwest::multipart::Part::bytes(audio.to_vec())
                .file_name("voice.ogg")
                .mime_str("audio/ogg")
                .map_err(|e| ConfabError::Transcription {
                    message: format!("failed to build upload part: {e}"),
                    source: Some(Box::new(e)),
                })?;
            let form = reqwest::multipart::Form::new()
                .part("file", file_part)
                .text("model", self.model.clone());

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(|e| ConfabError::Transcription {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "transcription response received");

            if status.is_success() {
                let parsed: TranscriptionResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| ConfabError::Transcription {
                            message: format!("failed to parse transcription response: {e}"),
                            source: Some(Box::new(e)),
                        })?;
                return Ok(parsed.text);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(ConfabError::Transcription {
                    message: format!("transcription service returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            return Err(ConfabError::Transcription {
                message: format!("transcription service returned {status}: {body}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| ConfabError::Transcription {
            message: "transcription request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: &str) -> SpeechConfig {
        SpeechConfig {
            endpoint: format!("{endpoint}/v1/audio/transcriptions"),
            model: "whisper-1".into(),
            timeout_secs: 5,
            api_key: Some("test-speech-key".into()),
        }
    }

    #[tokio::test]
    async fn transcribe_returns_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .and(header("authorization", "Bearer test-speech-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "hello from voice"})),
            )
            .mount(&server)
            .await;

        let client = SpeechClient::new(&test_config(&server.uri())).unwrap();
        let text = client.transcribe(b"fake-ogg-bytes").await.unwrap();
        assert_eq!(text, "hello from voice");
    }

    #[tokio::test]
    async fn transcribe_retries_on_500() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "recovered"})),
            )
            .mount(&server)
            .await;

        let client = SpeechClient::new(&test_config(&server.uri())).unwrap();
        let text = client.transcribe(b"fake-ogg-bytes").await.unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn transcribe_fails_on_400_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported codec"))
            .expect(1)
            .mount(&server)
            .await;

        let client = SpeechClient::new(&test_config(&server.uri())).unwrap();
        let err = client.transcribe(b"not-audio").await.unwrap_err();
        assert!(matches!(err, ConfabError::Transcription { .. }));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn new_requires_api_key() {
        // Config has no key; make sure the env fallback is absent too.
        unsafe { std::env::remove_var("CONFAB_SPEECH_API_KEY") };
        let config = SpeechConfig {
            api_key: None,
            ..SpeechConfig::default()
        };
        let err = SpeechClient::new(&config).unwrap_err();
        assert!(matches!(err, ConfabError::Config(_)));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn new_falls_back_to_env_key() {
        unsafe { std::env::set_var("CONFAB_SPEECH_API_KEY", "env-key") };
        let config = SpeechConfig {
            api_key: None,
            ..SpeechConfig::default()
        };
        let client = SpeechClient::new(&config);
        unsafe { std::env::remove_var("CONFAB_SPEECH_API_KEY") };
        assert!(client.is_ok());
    }
}
