// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Responder adapter trait for the response-generation service.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for the service that produces assistant replies.
///
/// The service owns conversation memory and prompt construction; this seam
/// only carries the normalized user text in and the reply text out.
#[async_trait]
pub trait ResponderAdapter: PluginAdapter {
    /// Generates a reply to `text` for the given user.
    ///
    /// `display_name` lets the service address the user by name. Failures
    /// surface as [`ConfabError::Generation`] and must never leak provider
    /// internals to the user.
    async fn generate(
        &self,
        user_id: &str,
        text: &str,
        display_name: &str,
    ) -> Result<String, ConfabError>;
}
