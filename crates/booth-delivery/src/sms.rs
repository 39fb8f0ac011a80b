// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio SMS/MMS delivery.
//!
//! The photo is staged into the upload directory first; when a public
//! `media_base_url` is configured the message carries a MediaUrl pointing
//! at the staged file, otherwise a body-only SMS is sent and the guest is
//! told where to collect the photo.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use booth_config::model::DeliveryConfig;
use booth_core::types::DeliveryChannel;
use booth_core::BoothError;
use serde::Deserialize;
use tracing::debug;

use crate::{e164, DeliveryAdapter, DeliveryJob};

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

pub struct TwilioSms {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
    media_base_url: Option<String>,
    upload_dir: PathBuf,
}

impl TwilioSms {
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, BoothError> {
        let twilio = &config.twilio;
        let account_sid = require(&twilio.account_sid, "delivery.twilio.account_sid")?;
        let auth_token = require(&twilio.auth_token, "delivery.twilio.auth_token")?;
        let from_number = require(&twilio.from_number, "delivery.twilio.from_number")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BoothError::Delivery {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            from_number,
            api_base: twilio.api_base.clone(),
            media_base_url: twilio.media_base_url.clone(),
            upload_dir: PathBuf::from(&config.upload_dir),
        })
    }
}

fn require(value: &Option<String>, key: &str) -> Result<String, BoothError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(String::from)
        .ok_or_else(|| BoothError::Config(format!("{key} is required for the sms channel")))
}

#[async_trait]
impl DeliveryAdapter for TwilioSms {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    async fn send(&self, job: &DeliveryJob) -> Result<Option<String>, BoothError> {
        // Stage the photo so the MediaUrl (or the operator) can reach it.
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| BoothError::Delivery {
                message: format!("create upload directory: {e}"),
                source: Some(Box::new(e)),
            })?;
        let filename = format!("photo_{}.jpg", job.session_id);
        tokio::fs::write(self.upload_dir.join(&filename), &job.photo)
            .await
            .map_err(|e| BoothError::Delivery {
                message: format!("stage photo file: {e}"),
                source: Some(Box::new(e)),
            })?;

        let body = format!(
            "Hi {}! Your photo from the booth is ready.",
            job.guest_name
        );
        let mut form = vec![
            ("To".to_string(), e164(&job.guest_phone)),
            ("From".to_string(), self.from_number.clone()),
            ("Body".to_string(), body),
        ];
        if let Some(base) = &self.media_base_url {
            let base = base.trim_end_matches('/');
            form.push(("MediaUrl".to_string(), format!("{base}/{filename}")));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| BoothError::Delivery {
                message: format!("twilio request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, session_id = %job.session_id, "twilio response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BoothError::Delivery {
                message: format!("twilio returned {status}: {body}"),
                source: None,
            });
        }

        let message: TwilioMessageResponse =
            response.json().await.map_err(|e| BoothError::Delivery {
                message: format!("twilio response parse failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(message.sid))
    }
}
