// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as channel credential completeness and kiosk id bounds.

use booth_core::types::DeliveryChannel;

use crate::diagnostic::ConfigError;
use crate::model::BoothConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BoothConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.kiosks.count == 0 {
        errors.push(ConfigError::Validation {
            message: "kiosks.count must be at least 1".to_string(),
        });
    }

    if config.kiosks.lease_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "kiosks.lease_timeout_secs must be at least 1".to_string(),
        });
    }

    // Location labels must reference kiosks that exist in the pool.
    for key in config.kiosks.locations.keys() {
        match key.parse::<u16>() {
            Ok(id) if id >= 1 && id <= config.kiosks.count => {}
            Ok(id) => errors.push(ConfigError::Validation {
                message: format!(
                    "kiosks.locations key `{id}` is outside the pool (1..={})",
                    config.kiosks.count
                ),
            }),
            Err(_) => errors.push(ConfigError::Validation {
                message: format!("kiosks.locations key `{key}` is not a kiosk id"),
            }),
        }
    }

    if config.verification.code_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "verification.code_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.verification.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "verification.max_attempts must be at least 1".to_string(),
        });
    }

    match config.delivery.channel {
        DeliveryChannel::Sms => {
            let twilio = &config.delivery.twilio;
            if twilio.account_sid.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.twilio.account_sid is required when delivery.channel = \"sms\""
                        .to_string(),
                });
            }
            if twilio.auth_token.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.twilio.auth_token is required when delivery.channel = \"sms\""
                        .to_string(),
                });
            }
            if twilio.from_number.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.twilio.from_number is required when delivery.channel = \"sms\""
                        .to_string(),
                });
            }
        }
        DeliveryChannel::Email => {
            let smtp = &config.delivery.smtp;
            if smtp.server.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.smtp.server must not be empty when delivery.channel = \"email\""
                        .to_string(),
                });
            }
            if smtp.username.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.smtp.username is required when delivery.channel = \"email\""
                        .to_string(),
                });
            }
            if smtp.password.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.smtp.password is required when delivery.channel = \"email\""
                        .to_string(),
                });
            }
        }
        DeliveryChannel::Local => {
            if config.delivery.upload_dir.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "delivery.upload_dir must not be empty when delivery.channel = \"local\""
                        .to_string(),
                });
            }
        }
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    if config.gateway.max_photo_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.max_photo_bytes must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = BoothConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = BoothConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_kiosks_fails_validation() {
        let mut config = BoothConfig::default();
        config.kiosks.count = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("kiosks.count"))));
    }

    #[test]
    fn location_outside_pool_fails_validation() {
        let mut config = BoothConfig::default();
        config.kiosks.count = 4;
        config
            .kiosks
            .locations
            .insert("9".to_string(), "attic".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("outside the pool"))));
    }

    #[test]
    fn sms_without_credentials_collects_all_missing_fields() {
        let mut config = BoothConfig::default();
        config.delivery.channel = DeliveryChannel::Sms;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn sms_with_full_credentials_validates() {
        let mut config = BoothConfig::default();
        config.delivery.channel = DeliveryChannel::Sms;
        config.delivery.twilio.account_sid = Some("AC123".to_string());
        config.delivery.twilio.auth_token = Some("secret".to_string());
        config.delivery.twilio.from_number = Some("+15551234567".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn email_without_credentials_fails_validation() {
        let mut config = BoothConfig::default();
        config.delivery.channel = DeliveryChannel::Email;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("smtp.username"))));
    }
}
