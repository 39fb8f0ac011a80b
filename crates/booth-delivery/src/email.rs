// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP email delivery with the photo as a JPEG attachment.

use async_trait::async_trait;
use booth_config::model::DeliveryConfig;
use booth_core::types::DeliveryChannel;
use booth_core::BoothError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::{DeliveryAdapter, DeliveryJob};

pub struct SmtpEmail {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmail {
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, BoothError> {
        let smtp = &config.smtp;
        let username = smtp
            .username
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                BoothError::Config(
                    "delivery.smtp.username is required for the email channel".to_string(),
                )
            })?;
        let password = smtp
            .password
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                BoothError::Config(
                    "delivery.smtp.password is required for the email channel".to_string(),
                )
            })?;

        let from_address = smtp.from_address.as_deref().unwrap_or(username);
        let from: Mailbox = from_address.parse().map_err(|e| {
            BoothError::Config(format!("delivery.smtp.from_address is invalid: {e}"))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)
            .map_err(|e| BoothError::Delivery {
                message: format!("smtp relay setup failed: {e}"),
                source: Some(Box::new(e)),
            })?
            .port(smtp.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, from })
    }

    /// Compose the outgoing message. Split out so tests can exercise
    /// composition without a live SMTP server.
    fn compose(&self, job: &DeliveryJob) -> Result<Message, BoothError> {
        let to_address = job.guest_email.as_deref().ok_or_else(|| {
            BoothError::Delivery {
                message: format!("session {} has no email address on file", job.session_id),
                source: None,
            }
        })?;
        let to: Mailbox = to_address.parse().map_err(|e| BoothError::Delivery {
            message: format!("invalid recipient address `{to_address}`: {e}"),
            source: None,
        })?;

        let body = format!(
            "Hi {}!\n\nYour photo from the booth is attached. Thanks for visiting!\n",
            job.guest_name
        );
        let attachment = Attachment::new(format!("photo_{}.jpg", job.session_id)).body(
            job.photo.clone(),
            ContentType::parse("image/jpeg").map_err(|e| BoothError::Internal(e.to_string()))?,
        );

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Your booth photo")
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(attachment),
            )
            .map_err(|e| BoothError::Delivery {
                message: format!("message build failed: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl DeliveryAdapter for SmtpEmail {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn send(&self, job: &DeliveryJob) -> Result<Option<String>, BoothError> {
        let message = self.compose(job)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| BoothError::Delivery {
                message: format!("smtp send failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(response.code().to_string()))
    }
}
