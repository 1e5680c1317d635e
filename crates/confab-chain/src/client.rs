// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the response-generation service.
//!
//! Provides [`ChainClient`] which handles request construction,
//! authentication, and transient error retry.

use std::time::Duration;

use confab_config::model::ChainConfig;
use confab_core::ConfabError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Request body sent to the generation endpoint.
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    user_id: &'a str,
    text: &'a str,
    display_name: &'a str,
}

/// Response body returned by the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    reply: String,
}

/// HTTP client for the chain service.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 5xx).
#[derive(Debug, Clone)]
pub struct ChainClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl ChainClient {
    /// Creates a new chain client from the `[chain]` config section.
    ///
    /// The API key is resolved from config first, then the
    /// `CONFAB_CHAIN_API_KEY` environment variable. The endpoint may be
    /// unauthenticated, so a missing key is not an error.
    pub fn new(config: &ChainConfig) -> Result<Self, ConfabError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("CONFAB_CHAIN_API_KEY").ok());
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ConfabError::Config(format!("invalid chain API key: {e}")))?;
            headers.insert("authorization", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfabError::Generation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            max_retries: 1,
        })
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests a reply for the given user message.
    ///
    /// On transient errors (429, 5xx), retries once after a 1-second delay.
    /// An empty reply from the service is treated as a generation failure.
    pub async fn generate(
        &self,
        user_id: &str,
        text: &str,
        display_name: &str,
    ) -> Result<String, ConfabError> {
        let body = GenerateRequest {
            user_id,
            text,
            display_name,
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generation request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&body)
                .send()
                .await
                .map_err(|e| ConfabError::Generation {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "generation response received");

            if status.is_success() {
                let parsed: GenerateResponse =
                    response.json().await.map_err(|e| ConfabError::Generation {
                        message: format!("failed to parse chain response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                if parsed.reply.trim().is_empty() {
                    return Err(ConfabError::Generation {
                        message: "chain returned an empty reply".into(),
                        source: None,
                    });
                }
                return Ok(parsed.reply);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(ConfabError::Generation {
                    message: format!("chain returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            return Err(ConfabError::Generation {
                message: format!("chain returned {status}: {body}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| ConfabError::Generation {
            message: "generation request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}
