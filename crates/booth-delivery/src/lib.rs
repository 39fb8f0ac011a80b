// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo delivery channels for the booth service.
//!
//! One channel is selected at deployment via `[delivery]` config. Every
//! dispatch is at-most-once: the dispatcher makes a single attempt and
//! records the outcome, never raising past its boundary. A failed send
//! still lets the session complete; the attempt record is the audit trail.

pub mod email;
pub mod local;
pub mod sms;

use async_trait::async_trait;
use booth_config::model::DeliveryConfig;
use booth_core::time::format_ts;
use booth_core::types::{DeliveryChannel, DeliveryOutcome, DeliveryRecord};
use booth_core::BoothError;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Everything an adapter needs to deliver one kept photo.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub session_id: String,
    pub guest_name: String,
    /// Normalized 11-digit US number.
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub photo: Vec<u8>,
}

/// A single delivery channel implementation.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync {
    fn channel(&self) -> DeliveryChannel;

    /// Attempt the send once. On success returns the provider reference
    /// (message SID, SMTP response, or local filename).
    async fn send(&self, job: &DeliveryJob) -> Result<Option<String>, BoothError>;
}

/// Channel-agnostic dispatcher wrapping the configured adapter.
pub struct Dispatcher {
    adapter: Box<dyn DeliveryAdapter>,
}

impl Dispatcher {
    pub fn new(adapter: Box<dyn DeliveryAdapter>) -> Self {
        Self { adapter }
    }

    /// Build the dispatcher for the configured channel.
    ///
    /// Credential completeness is enforced by config validation before this
    /// point; missing values here are surfaced as config errors anyway so a
    /// hand-built `DeliveryConfig` cannot produce a half-wired adapter.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, BoothError> {
        let adapter: Box<dyn DeliveryAdapter> = match config.channel {
            DeliveryChannel::Sms => Box::new(sms::TwilioSms::from_config(config)?),
            DeliveryChannel::Email => Box::new(email::SmtpEmail::from_config(config)?),
            DeliveryChannel::Local => Box::new(local::LocalDelivery::new(&config.upload_dir)),
        };
        Ok(Self { adapter })
    }

    pub fn channel(&self) -> DeliveryChannel {
        self.adapter.channel()
    }

    /// Make exactly one delivery attempt and record its outcome.
    ///
    /// Never returns an error: adapter failures become a `Failed` record.
    pub async fn dispatch(&self, job: &DeliveryJob) -> DeliveryRecord {
        self.dispatch_at(job, Utc::now()).await
    }

    /// [`Self::dispatch`] with an explicit attempt instant.
    pub async fn dispatch_at(&self, job: &DeliveryJob, now: DateTime<Utc>) -> DeliveryRecord {
        let channel = self.adapter.channel();
        match self.adapter.send(job).await {
            Ok(provider_reference) => {
                info!(
                    session_id = %job.session_id,
                    %channel,
                    reference = provider_reference.as_deref().unwrap_or("-"),
                    "photo delivered"
                );
                DeliveryRecord {
                    session_id: job.session_id.clone(),
                    channel,
                    attempted_at: format_ts(now),
                    outcome: DeliveryOutcome::Sent,
                    provider_reference,
                }
            }
            Err(e) => {
                warn!(session_id = %job.session_id, %channel, error = %e, "delivery failed");
                DeliveryRecord {
                    session_id: job.session_id.clone(),
                    channel,
                    attempted_at: format_ts(now),
                    outcome: DeliveryOutcome::Failed,
                    provider_reference: None,
                }
            }
        }
    }
}

/// Render a stored 11-digit number in E.164 form.
pub(crate) fn e164(phone: &str) -> String {
    format!("+{phone}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FailingAdapter;

    #[async_trait]
    impl DeliveryAdapter for FailingAdapter {
        fn channel(&self) -> DeliveryChannel {
            DeliveryChannel::Sms
        }

        async fn send(&self, _job: &DeliveryJob) -> Result<Option<String>, BoothError> {
            Err(BoothError::Delivery {
                message: "provider unreachable".to_string(),
                source: None,
            })
        }
    }

    fn make_job() -> DeliveryJob {
        DeliveryJob {
            session_id: "s-1".to_string(),
            guest_name: "Ana".to_string(),
            guest_phone: "15551234567".to_string(),
            guest_email: None,
            photo: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[tokio::test]
    async fn adapter_failure_becomes_failed_record() {
        let dispatcher = Dispatcher::new(Box::new(FailingAdapter));
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        let record = dispatcher.dispatch_at(&make_job(), now).await;
        assert_eq!(record.outcome, DeliveryOutcome::Failed);
        assert_eq!(record.channel, DeliveryChannel::Sms);
        assert_eq!(record.attempted_at, "2026-01-01T12:00:00.000Z");
        assert!(record.provider_reference.is_none());
    }

    #[test]
    fn e164_prefixes_plus() {
        assert_eq!(e164("15551234567"), "+15551234567");
    }

    #[test]
    fn local_channel_builds_from_default_config() {
        let config = DeliveryConfig::default();
        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert_eq!(dispatcher.channel(), DeliveryChannel::Local);
    }
}
