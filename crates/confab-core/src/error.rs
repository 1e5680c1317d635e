// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Confab assistant.

use thiserror::Error;

/// The primary error type used across all Confab adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ConfabError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// History store errors (database connection, query failure, migration).
    /// The store is unavailable; committed turns are unaffected.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport delivery errors (connection failure, API rejection, rate limiting).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The transport's inbound stream has ended and will yield no more
    /// events. Terminal: callers stop receiving rather than retry.
    #[error("transport closed")]
    TransportClosed,

    /// Response generation errors from the chain service.
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Voice transcription errors (fetch, upload, or decode failure).
    #[error("transcription error: {message}")]
    Transcription {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user's balance does not cover the requested spend.
    #[error("insufficient credit: required {required}, available {available}")]
    InsufficientCredit { required: i64, available: i64 },

    /// A precheckout carried a payload this bot did not issue.
    #[error("payment payload mismatch: expected {expected:?}, got {got:?}")]
    PaymentPayloadMismatch { expected: String, got: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConfabError {
    /// True for errors whose cause is the user's own state (credit, payload)
    /// rather than a fault in this process or an upstream service.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ConfabError::InsufficientCredit { .. } | ConfabError::PaymentPayloadMismatch { .. }
        )
    }
}
