// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Confab assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Confab configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfabConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Reply generation engine settings.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Voice transcription engine settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credit metering settings.
    #[serde(default)]
    pub credit: CreditConfig,

    /// Payment provider settings.
    #[serde(default)]
    pub payments: PaymentsConfig,
}


/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "confab".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather. Falls back to `CONFAB_TELEGRAM_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Numeric Telegram user IDs allowed to talk to the bot.
    /// An empty list means every user is allowed.
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

/// Reply generation engine configuration.
///
/// The engine is an HTTP service that accepts a user message and returns
/// the assistant's reply.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// URL of the generation endpoint.
    #[serde(default = "default_chain_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_chain_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token for the endpoint, if it requires one.
    /// Falls back to `CONFAB_CHAIN_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chain_endpoint(),
            timeout_secs: default_chain_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_chain_endpoint() -> String {
    "http://127.0.0.1:8090/generate".to_string()
}

fn default_chain_timeout_secs() -> u64 {
    120
}

/// Voice transcription engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// URL of the transcription endpoint (OpenAI-compatible).
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    /// Transcription model identifier.
    #[serde(default = "default_speech_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,

    /// API key for the endpoint. Falls back to `CONFAB_SPEECH_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            model: default_speech_model(),
            timeout_secs: default_speech_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_speech_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_speech_model() -> String {
    "whisper-1".to_string()
}

fn default_speech_timeout_secs() -> u64 {
    60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("confab").join("confab.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("confab.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Credit metering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditConfig {
    /// When true, turns are never gated or charged.
    #[serde(default = "default_free_mode")]
    pub free_mode: bool,

    /// Credit units charged per completed turn.
    #[serde(default = "default_cost_per_turn")]
    pub cost_per_turn: i64,

    /// Unit in which purchased credit is denominated.
    #[serde(default = "default_quota_unit")]
    pub quota_unit: QuotaUnit,

    /// Credit units granted per dollar paid.
    #[serde(default = "default_units_per_dollar")]
    pub units_per_dollar: i64,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            free_mode: default_free_mode(),
            cost_per_turn: default_cost_per_turn(),
            quota_unit: default_quota_unit(),
            units_per_dollar: default_units_per_dollar(),
        }
    }
}

fn default_free_mode() -> bool {
    true
}

fn default_cost_per_turn() -> i64 {
    1
}

fn default_quota_unit() -> QuotaUnit {
    QuotaUnit::Minute
}

fn default_units_per_dollar() -> i64 {
    1
}

/// Unit in which purchased credit is denominated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaUnit {
    /// Credit buys minutes of conversation.
    Minute,
    /// Credit buys individual exchanges.
    Turn,
}

/// Payment provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentsConfig {
    /// Telegram Payments provider token. Unset disables the deposit flow.
    /// Falls back to `CONFAB_PAYMENTS_PROVIDER_TOKEN`.
    #[serde(default)]
    pub provider_token: Option<String>,

    /// ISO 4217 currency code used for invoices.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Invoice payload stamp used to recognize our own invoices at checkout.
    #[serde(default = "default_payload")]
    pub payload: String,

    /// Whole-dollar amounts offered in the deposit menu.
    #[serde(default = "default_amounts")]
    pub amounts: Vec<i64>,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            provider_token: None,
            currency: default_currency(),
            payload: default_payload(),
            amounts: default_amounts(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_payload() -> String {
    "confab-deposit".to_string()
}

fn default_amounts() -> Vec<i64> {
    vec![10, 20, 30, 50]
}
