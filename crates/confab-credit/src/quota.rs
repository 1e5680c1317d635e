// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota policy: how paid money turns into credit, and when turns are gated.
//!
//! The policy is pure arithmetic over the `[credit]` config section; the
//! persistent balance itself lives in [`crate::ledger::CreditLedger`].

use confab_config::model::{CreditConfig, QuotaUnit};

/// Gating and conversion rules derived from the credit configuration.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    free_mode: bool,
    cost_per_turn: i64,
    quota_unit: QuotaUnit,
    units_per_dollar: i64,
}

impl QuotaPolicy {
    /// Build a policy from the credit config section.
    pub fn new(config: &CreditConfig) -> Self {
        Self {
            free_mode: config.free_mode,
            cost_per_turn: config.cost_per_turn,
            quota_unit: config.quota_unit,
            units_per_dollar: config.units_per_dollar,
        }
    }

    /// Whether turns are gated and charged at all.
    ///
    /// Free mode disables metering entirely, as does a zero cost per turn.
    pub fn metered(&self) -> bool {
        !self.free_mode && self.cost_per_turn > 0
    }

    /// Credit units charged for one completed turn.
    pub fn cost_per_turn(&self) -> i64 {
        self.cost_per_turn
    }

    /// Credit units granted for a paid amount in minor currency units.
    ///
    /// Whole dollars only; a fractional remainder does not grant credit.
    pub fn amount_to_quota(&self, amount_minor: i64) -> i64 {
        amount_minor / 100 * self.units_per_dollar
    }

    /// Human description of a credit grant, e.g. "5 minutes" or "1 turn".
    pub fn describe(&self, units: i64) -> String {
        let noun = match self.quota_unit {
            QuotaUnit::Minute => {
                if units == 1 {
                    "minute"
                } else {
                    "minutes"
                }
            }
            QuotaUnit::Turn => {
                if units == 1 {
                    "turn"
                } else {
                    "turns"
                }
            }
        };
        format!("{units} {noun}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(free_mode: bool, cost_per_turn: i64, units_per_dollar: i64) -> CreditConfig {
        CreditConfig {
            free_mode,
            cost_per_turn,
            quota_unit: QuotaUnit::Minute,
            units_per_dollar,
        }
    }

    #[test]
    fn free_mode_is_not_metered() {
        let policy = QuotaPolicy::new(&config(true, 1, 1));
        assert!(!policy.metered());
    }

    #[test]
    fn zero_cost_is_not_metered() {
        let policy = QuotaPolicy::new(&config(false, 0, 1));
        assert!(!policy.metered());
    }

    #[test]
    fn paid_mode_with_cost_is_metered() {
        let policy = QuotaPolicy::new(&config(false, 1, 1));
        assert!(policy.metered());
        assert_eq!(policy.cost_per_turn(), 1);
    }

    #[test]
    fn amount_to_quota_converts_whole_dollars() {
        let policy = QuotaPolicy::new(&config(false, 1, 1));
        assert_eq!(policy.amount_to_quota(1000), 10);
        assert_eq!(policy.amount_to_quota(5000), 50);
    }

    #[test]
    fn amount_to_quota_scales_with_units_per_dollar() {
        let policy = QuotaPolicy::new(&config(false, 1, 3));
        assert_eq!(policy.amount_to_quota(1000), 30);
    }

    #[test]
    fn amount_to_quota_truncates_fractional_dollars() {
        let policy = QuotaPolicy::new(&config(false, 1, 2));
        // $10.50 grants credit for $10 only.
        assert_eq!(policy.amount_to_quota(1050), 20);
        assert_eq!(policy.amount_to_quota(99), 0);
    }

    #[test]
    fn describe_pluralizes_minutes() {
        let policy = QuotaPolicy::new(&config(false, 1, 1));
        assert_eq!(policy.describe(1), "1 minute");
        assert_eq!(policy.describe(10), "10 minutes");
    }

    #[test]
    fn describe_pluralizes_turns() {
        let config = CreditConfig {
            free_mode: false,
            cost_per_turn: 1,
            quota_unit: QuotaUnit::Turn,
            units_per_dollar: 1,
        };
        let policy = QuotaPolicy::new(&config);
        assert_eq!(policy.describe(1), "1 turn");
        assert_eq!(policy.describe(30), "30 turns");
    }
}
