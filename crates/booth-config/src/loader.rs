// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./booth.toml` > `~/.config/booth/booth.toml` > `/etc/booth/booth.toml`
//! with environment variable overrides via `BOOTH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BoothConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/booth/booth.toml` (system-wide)
/// 3. `~/.config/booth/booth.toml` (user XDG config)
/// 4. `./booth.toml` (local directory)
/// 5. `BOOTH_*` environment variables
pub fn load_config() -> Result<BoothConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BoothConfig::default()))
        .merge(Toml::file("/etc/booth/booth.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("booth/booth.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("booth.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<BoothConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BoothConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BoothConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BoothConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `BOOTH_VERIFICATION_CODE_TTL_SECS`
/// must map to `verification.code_ttl_secs`, not `verification.code.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("BOOTH_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: BOOTH_DELIVERY_TWILIO_AUTH_TOKEN -> "delivery_twilio_auth_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("booth_", "booth.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("kiosks_", "kiosks.", 1)
            .replacen("verification_", "verification.", 1)
            .replacen("delivery_twilio_", "delivery.twilio.", 1)
            .replacen("delivery_smtp_", "delivery.smtp.", 1)
            .replacen("delivery_", "delivery.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
