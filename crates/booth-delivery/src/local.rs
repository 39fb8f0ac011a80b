// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local filesystem delivery.
//!
//! Writes the photo into the upload directory and appends one line to
//! `photo_log.txt` so an operator can match files to guests without a
//! database query.

use std::path::PathBuf;

use async_trait::async_trait;
use booth_core::types::DeliveryChannel;
use booth_core::BoothError;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::{DeliveryAdapter, DeliveryJob};

pub struct LocalDelivery {
    upload_dir: PathBuf,
}

impl LocalDelivery {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

#[async_trait]
impl DeliveryAdapter for LocalDelivery {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Local
    }

    async fn send(&self, job: &DeliveryJob) -> Result<Option<String>, BoothError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| delivery_io_err("create upload directory", e))?;

        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let filename = format!("photo_{}_{stamp}.jpg", job.session_id);
        let path = self.upload_dir.join(&filename);

        tokio::fs::write(&path, &job.photo)
            .await
            .map_err(|e| delivery_io_err("write photo file", e))?;

        let line = format!(
            "{} session={} guest={} phone={} file={}\n",
            booth_core::time::now_ts(),
            job.session_id,
            job.guest_name,
            job.guest_phone,
            filename,
        );
        let mut log = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.upload_dir.join("photo_log.txt"))
            .await
            .map_err(|e| delivery_io_err("open photo log", e))?;
        log.write_all(line.as_bytes())
            .await
            .map_err(|e| delivery_io_err("append photo log", e))?;

        Ok(Some(filename))
    }
}

fn delivery_io_err(action: &str, e: std::io::Error) -> BoothError {
    BoothError::Delivery {
        message: format!("{action}: {e}"),
        source: Some(Box::new(e)),
    }
}
