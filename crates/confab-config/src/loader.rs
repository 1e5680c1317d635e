// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./confab.toml` > `~/.config/confab/confab.toml` > `/etc/confab/confab.toml`
//! with environment variable overrides via `CONFAB_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ConfabConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/confab/confab.toml` (system-wide)
/// 3. `~/.config/confab/confab.toml` (user XDG config)
/// 4. `./confab.toml` (local directory)
/// 5. `CONFAB_*` environment variables
pub fn load_config() -> Result<ConfabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::file("/etc/confab/confab.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("confab/confab.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("confab.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a specific TOML file path only (no XDG lookup).
///
/// Used for testing and explicit config file specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ConfabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConfabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::file("/etc/confab/confab.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("confab/confab.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("confab.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CONFAB_TELEGRAM_BOT_TOKEN` must
/// map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("CONFAB_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CONFAB_TELEGRAM_BOT_TOKEN -> "telegram_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("chain_", "chain.", 1)
            .replacen("speech_", "speech.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("credit_", "credit.", 1)
            .replacen("payments_", "payments.", 1);
        mapped.into()
    })
}
