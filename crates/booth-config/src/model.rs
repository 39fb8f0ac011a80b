// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the booth service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use booth_core::types::DeliveryChannel;
use serde::{Deserialize, Serialize};

/// Top-level booth configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BoothConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub booth: BoothSettings,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Kiosk pool settings.
    #[serde(default)]
    pub kiosks: KioskConfig,

    /// Verification code settings.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Photo delivery settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BoothSettings {
    /// Display name of the deployment (shown in logs and admin output).
    #[serde(default = "default_booth_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BoothSettings {
    fn default() -> Self {
        Self {
            name: default_booth_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_booth_name() -> String {
    "booth".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
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
        .map(|p| p.join("booth").join("booth.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "booth.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Kiosk pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KioskConfig {
    /// Number of numbered kiosks in the pool (ids 1..=count).
    #[serde(default = "default_kiosk_count")]
    pub count: u16,

    /// Lease validity window in seconds before a stale lease may be reclaimed.
    #[serde(default = "default_lease_timeout_secs")]
    pub lease_timeout_secs: u64,

    /// Optional location labels keyed by kiosk id, e.g. `1 = "lobby"`.
    #[serde(default)]
    pub locations: BTreeMap<String, String>,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            count: default_kiosk_count(),
            lease_timeout_secs: default_lease_timeout_secs(),
            locations: BTreeMap::new(),
        }
    }
}

fn default_kiosk_count() -> u16 {
    booth_core::types::MAX_KIOSK_ID
}

fn default_lease_timeout_secs() -> u64 {
    booth_core::types::DEFAULT_LEASE_TIMEOUT_SECS
}

/// Verification code configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Code validity window in seconds.
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,

    /// Maximum submission attempts before the session is force-expired.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_code_ttl_secs() -> u64 {
    booth_core::types::DEFAULT_CODE_TTL_SECS
}

fn default_max_attempts() -> u32 {
    booth_core::types::MAX_VERIFY_ATTEMPTS
}

/// Photo delivery configuration. The channel is selected once at deployment,
/// not per session.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Delivery channel: sms, email, or local.
    #[serde(default = "default_channel")]
    pub channel: DeliveryChannel,

    /// Directory for locally stored photos (used by the local channel and
    /// as the media staging area for SMS).
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Twilio settings, required when channel = "sms".
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// SMTP settings, required when channel = "email".
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            upload_dir: default_upload_dir(),
            twilio: TwilioConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

fn default_channel() -> DeliveryChannel {
    DeliveryChannel::Local
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

/// Twilio REST API credentials for the SMS channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sending number in E.164 format.
    #[serde(default)]
    pub from_number: Option<String>,

    /// API base URL, overridable for testing against a mock server.
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,

    /// Public base URL under which staged photos are reachable, used to
    /// build the MMS MediaUrl. Body-only message when unset.
    #[serde(default)]
    pub media_base_url: Option<String>,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            api_base: default_twilio_api_base(),
            media_base_url: None,
        }
    }
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

/// SMTP credentials for the email channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Sender address; falls back to `username` when unset.
    #[serde(default)]
    pub from_address: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from_address: None,
        }
    }
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Maximum accepted decoded photo size in bytes.
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            max_photo_bytes: default_max_photo_bytes(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_max_photo_bytes() -> usize {
    16 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_domain_constants() {
        let config = BoothConfig::default();
        assert_eq!(config.kiosks.count, 50);
        assert_eq!(config.kiosks.lease_timeout_secs, 1800);
        assert_eq!(config.verification.code_ttl_secs, 120);
        assert_eq!(config.verification.max_attempts, 5);
        assert_eq!(config.delivery.channel, DeliveryChannel::Local);
    }

    #[test]
    fn locations_table_deserializes() {
        let toml_str = r#"
[kiosks]
count = 4

[kiosks.locations]
1 = "lobby"
2 = "entrance"
"#;
        let config: BoothConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.kiosks.count, 4);
        assert_eq!(config.kiosks.locations.get("1").unwrap(), "lobby");
        assert_eq!(config.kiosks.locations.get("2").unwrap(), "entrance");
    }

    #[test]
    fn unknown_field_in_section_is_rejected() {
        let toml_str = r#"
[verification]
code_ttl_seconds = 60
"#;
        assert!(toml::from_str::<BoothConfig>(toml_str).is_err());
    }

    #[test]
    fn channel_parses_from_lowercase() {
        let config: BoothConfig = toml::from_str("[delivery]\nchannel = \"email\"\n").unwrap();
        assert_eq!(config.delivery.channel, DeliveryChannel::Email);
    }
}
