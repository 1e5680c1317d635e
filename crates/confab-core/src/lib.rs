// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Confab assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Confab workspace. All adapters
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ConfabError;
pub use types::{
    AdapterType, FailReason, FileRef, HealthStatus, InboundContent, InboundEvent, MessageRef,
    OutboundMessage, PriceOption, RejectReason, Turn, TurnOutcome, UserCommand, UserProfile,
    now_rfc3339,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    HistoryAdapter, PluginAdapter, ResponderAdapter, TranscriberAdapter, TransportAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confab_error_has_all_variants() {
        // Verify all 9 error variants exist and can be constructed.
        let _config = ConfabError::Config("test".into());
        let _storage = ConfabError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _transport = ConfabError::Transport {
            message: "test".into(),
            source: None,
        };
        let _generation = ConfabError::Generation {
            message: "test".into(),
            source: None,
        };
        let _transcription = ConfabError::Transcription {
            message: "test".into(),
            source: None,
        };
        let _credit = ConfabError::InsufficientCredit {
            required: 1,
            available: 0,
        };
        let _payload = ConfabError::PaymentPayloadMismatch {
            expected: "confab-deposit".into(),
            got: "other".into(),
        };
        let _timeout = ConfabError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = ConfabError::Internal("test".into());
    }

    #[test]
    fn user_facing_errors_are_flagged() {
        let credit = ConfabError::InsufficientCredit {
            required: 2,
            available: 1,
        };
        assert!(credit.is_user_facing());

        let internal = ConfabError::Internal("boom".into());
        assert!(!internal.is_user_facing());
    }

    #[test]
    fn adapter_type_has_four_variants() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Transport,
            AdapterType::Responder,
            AdapterType::Transcriber,
            AdapterType::Storage,
        ];

        assert_eq!(variants.len(), 4, "AdapterType must have exactly 4 variants");

        // Verify Display and FromStr round-trip for all variants.
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn message_and_file_refs() {
        let mref = MessageRef("42".into());
        let fref = FileRef("voice-abc".into());

        let mref2 = mref.clone();
        assert_eq!(mref, mref2);
        assert_eq!(mref.to_string(), "42");
        assert_eq!(fref.to_string(), "voice-abc");
    }

    #[test]
    fn outbound_message_constructors() {
        let plain = OutboundMessage::text("7", "hello");
        assert_eq!(plain.user_id, "7");
        assert!(plain.reply_to.is_none());
        assert!(plain.menu.is_none());

        let threaded = OutboundMessage::reply("7", "hello", MessageRef("9".into()));
        assert_eq!(threaded.reply_to, Some(MessageRef("9".into())));
    }

    #[test]
    fn turn_outcome_display() {
        let delivered = TurnOutcome::Delivered {
            message: MessageRef("1".into()),
        };
        assert_eq!(delivered.to_string(), "delivered");
        assert_eq!(
            TurnOutcome::Rejected(RejectReason::InsufficientCredit).to_string(),
            "rejected (insufficient credit)"
        );
        assert_eq!(
            TurnOutcome::Failed(FailReason::Generation).to_string(),
            "failed (generation)"
        );
    }

    #[test]
    fn display_name_is_first_name() {
        let profile = UserProfile {
            user_id: "1".into(),
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
        };
        assert_eq!(profile.display_name(), "Ada");
    }

    #[test]
    fn timestamp_format_is_sortable_utc() {
        let ts = now_rfc3339();
        // 2026-01-02T03:04:05.678Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        chrono::DateTime::parse_from_rfc3339(&ts).expect("timestamp should parse");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // This test verifies that all adapter trait modules compile and are
        // accessible through the public API. If any module is missing or has
        // a compile error, this test won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_transport_adapter<T: TransportAdapter>() {}
        fn _assert_responder_adapter<T: ResponderAdapter>() {}
        fn _assert_transcriber_adapter<T: TranscriberAdapter>() {}
        fn _assert_history_adapter<T: HistoryAdapter>() {}
    }
}
