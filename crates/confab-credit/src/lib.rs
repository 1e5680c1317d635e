// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit metering and payment quota policy for the Confab assistant.
//!
//! This crate provides:
//! - **Credit ledger**: Persistent per-user balances with atomic consume and
//!   a payments audit trail
//! - **Quota policy**: Conversion between paid amounts and credit units, and
//!   the free-mode/cost-per-turn gating rules

pub mod ledger;
pub mod quota;

pub use ledger::CreditLedger;
pub use quota::QuotaPolicy;
