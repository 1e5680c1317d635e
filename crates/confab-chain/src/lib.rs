// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response-generation adapter for the Confab assistant.
//!
//! Implements [`ResponderAdapter`] over an HTTP service ("the chain") that
//! owns conversation memory and prompt construction. This crate only
//! carries the normalized user text in and the reply text out.

pub mod client;

use async_trait::async_trait;

use confab_config::model::ChainConfig;
use confab_core::{AdapterType, ConfabError, HealthStatus, PluginAdapter, ResponderAdapter};

pub use client::ChainClient;

/// Responder adapter backed by the chain HTTP service.
pub struct ChainResponder {
    client: ChainClient,
}

impl ChainResponder {
    /// Creates the responder from the `[chain]` config section.
    pub fn new(config: &ChainConfig) -> Result<Self, ConfabError> {
        let client = ChainClient::new(config)?;
        Ok(Self { client })
    }

    /// Returns the underlying HTTP client.
    pub fn client(&self) -> &ChainClient {
        &self.client
    }
}

#[async_trait]
impl PluginAdapter for ChainResponder {
    fn name(&self) -> &str {
        "chain"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        // A reachable endpoint is healthy regardless of status code; only
        // connection-level failures mean the service is down.
        let probe = reqwest::Client::new()
            .head(self.client.endpoint())
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await;
        match probe {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "chain endpoint unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        Ok(())
    }
}

#[async_trait]
impl ResponderAdapter for ChainResponder {
    async fn generate(
        &self,
        user_id: &str,
        text: &str,
        display_name: &str,
    ) -> Result<String, ConfabError> {
        self.client.generate(user_id, text, display_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: String) -> ChainConfig {
        ChainConfig {
            endpoint,
            timeout_secs: 5,
            api_key: None,
        }
    }

    #[test]
    fn plugin_adapter_metadata() {
        let responder = ChainResponder::new(&ChainConfig::default()).unwrap();
        assert_eq!(responder.name(), "chain");
        assert_eq!(responder.adapter_type(), AdapterType::Responder);
        assert_eq!(responder.version(), semver::Version::new(0, 1, 0));
    }

    #[tokio::test]
    async fn generate_goes_through_the_client() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"reply": "adapter reply"})),
            )
            .mount(&server)
            .await;

        let responder =
            ChainResponder::new(&test_config(format!("{}/generate", server.uri()))).unwrap();
        let reply = responder.generate("u1", "hi", "Bob").await.unwrap();
        assert_eq!(reply, "adapter reply");
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_endpoint() {
        // Port 9 (discard) is almost certainly closed.
        let responder =
            ChainResponder::new(&test_config("http://127.0.0.1:9/generate".into())).unwrap();
        let status = responder.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
