//! Cloudinary signed uploads.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use super::{MediaStorage, UploadFile, UploadedMedia};
use crate::core::config::CloudinaryConfig;
use crate::core::error::{GatewayError, GatewayResult};

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: String,
    public_id: String,
}

pub struct CloudinaryStorage {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build media HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Hex SHA-256 of the alphabetically sorted params followed by the API secret
    pub fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<_> = params.iter().filter(|(_, value)| !value.is_empty()).collect();
        sorted.sort_by_key(|(key, _)| *key);

        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, file: UploadFile, folder: &str) -> GatewayResult<UploadedMedia> {
        let started = Instant::now();
        let folder = format!("{}/{}", self.config.folder.trim_end_matches('/'), folder);
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder.clone()), ("timestamp", timestamp.clone())]);

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| GatewayError::upload(format!("Invalid content type: {}", e)))?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::upload(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, file = %file.file_name, "Cloudinary rejected upload");
            metrics::counter!("media_uploads_total", "outcome" => "rejected").increment(1);
            return Err(GatewayError::upload(format!("Cloudinary returned {}", status)));
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|e| GatewayError::upload(format!("Unexpected Cloudinary reply: {}", e)))?;

        debug!(public_id = %reply.public_id, elapsed_ms = started.elapsed().as_millis() as u64, "Uploaded media");
        metrics::counter!("media_uploads_total", "outcome" => "ok").increment(1);
        metrics::histogram!("media_upload_duration_seconds").record(started.elapsed().as_secs_f64());

        Ok(UploadedMedia {
            url: reply.secure_url,
            public_id: reply.public_id,
        })
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
