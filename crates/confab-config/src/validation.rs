// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as endpoint URL shapes, known log levels, and non-negative credit rates.

use crate::diagnostic::ConfigError;
use crate::model::ConfabConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ConfabConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate agent.name is not empty
    if config.agent.name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "agent.name must not be empty".to_string(),
        });
    }

    // Validate log_level is a known tracing level
    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of trace, debug, info, warn, error; got `{}`",
                config.agent.log_level
            ),
        });
    }

    // Validate endpoints are http(s) URLs
    for (key, endpoint) in [
        ("chain.endpoint", &config.chain.endpoint),
        ("speech.endpoint", &config.speech.endpoint),
    ] {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        } else if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be an http(s) URL, got `{trimmed}`"),
            });
        }
    }

    // Validate request timeouts are non-zero
    if config.chain.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "chain.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.speech.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "speech.timeout_secs must be at least 1".to_string(),
        });
    }

    // Validate speech.model is not empty
    if config.speech.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "speech.model must not be empty".to_string(),
        });
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate credit rates
    if config.credit.cost_per_turn < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "credit.cost_per_turn must be non-negative, got {}",
                config.credit.cost_per_turn
            ),
        });
    }

    if config.credit.units_per_dollar < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "credit.units_per_dollar must be at least 1, got {}",
                config.credit.units_per_dollar
            ),
        });
    }

    // Validate allowed_users entries are positive Telegram IDs
    for id in &config.telegram.allowed_users {
        if *id <= 0 {
            errors.push(ConfigError::Validation {
                message: format!("telegram.allowed_users entries must be positive, got {id}"),
            });
        }
    }

    // Validate payment settings
    if config.payments.currency.trim().len() != 3 {
        errors.push(ConfigError::Validation {
            message: format!(
                "payments.currency must be a 3-letter ISO 4217 code, got `{}`",
                config.payments.currency
            ),
        });
    }

    if config.payments.payload.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "payments.payload must not be empty".to_string(),
        });
    }

    for amount in &config.payments.amounts {
        if *amount <= 0 {
            errors.push(ConfigError::Validation {
                message: format!("payments.amounts entries must be positive, got {amount}"),
            });
        }
    }

    if config.payments.provider_token.is_some() && config.payments.amounts.is_empty() {
        errors.push(ConfigError::Validation {
            message: "payments.amounts must not be empty when a provider token is set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
