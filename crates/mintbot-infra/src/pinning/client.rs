//! NftStoragePublisher -- concrete [`MetadataPublisher`] for nft.storage-style
//! pinning APIs.
//!
//! Both the image and the metadata JSON go through `POST {endpoint}/upload`
//! with bearer auth. The returned CID is rendered as `{gateway}{cid}`.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use mintbot_core::ports::MetadataPublisher;
use mintbot_types::config::PinningConfig;
use mintbot_types::error::PublishError;
use mintbot_types::token::{ImageReference, OffChainMetadata};

use super::types::{MetadataDocument, UploadResponse};

/// Largest image accepted for pinning.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// Holds the API key; no Debug.
pub struct NftStoragePublisher {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
    gateway: String,
}

impl NftStoragePublisher {
    pub fn new(config: &PinningConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            gateway: config.gateway.clone(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/upload", self.endpoint)
    }

    fn gateway_uri(&self, cid: &str) -> String {
        format!("{}{cid}", self.gateway)
    }

    async fn upload(
        &self,
        body: Vec<u8>,
        content_type: &'static str,
    ) -> Result<String, PublishError> {
        let api_key = self.api_key.as_ref().ok_or(PublishError::MissingCredentials)?;

        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(api_key.expose_secret())
            .header("content-type", content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| PublishError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), body));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
        cid_from(parsed)
    }
}

impl MetadataPublisher for NftStoragePublisher {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_image(&self, image: &ImageReference) -> Result<Vec<u8>, PublishError> {
        let mut response = self
            .client
            .get(image.as_str())
            .send()
            .await
            .map_err(|e| PublishError::ImageFetch(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::ImageFetch(format!("HTTP {status}")));
        }

        check_declared_length(response.content_length(), MAX_IMAGE_BYTES)?;

        // The declared length may be absent or wrong; enforce the cap while
        // streaming.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PublishError::ImageFetch(e.without_url().to_string()))?
        {
            append_capped(&mut bytes, &chunk, MAX_IMAGE_BYTES)?;
        }
        tracing::debug!(bytes = bytes.len(), "image downloaded");
        Ok(bytes)
    }

    async fn publish(
        &self,
        image: Vec<u8>,
        metadata: &OffChainMetadata,
    ) -> Result<String, PublishError> {
        let image_cid = self.upload(image, "application/octet-stream").await?;
        tracing::info!(cid = %image_cid, "image pinned");

        let document = MetadataDocument::new(metadata, self.gateway_uri(&image_cid));
        let json = serde_json::to_vec(&document)
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        let metadata_cid = self.upload(json, "application/json").await?;
        tracing::info!(cid = %metadata_cid, "metadata pinned");
        Ok(self.gateway_uri(&metadata_cid))
    }
}

fn too_large(limit: usize) -> PublishError {
    PublishError::ImageFetch(format!("image larger than {} MiB", limit / (1024 * 1024)))
}

fn check_declared_length(declared: Option<u64>, limit: usize) -> Result<(), PublishError> {
    match declared {
        Some(len) if len > limit as u64 => Err(too_large(limit)),
        _ => Ok(()),
    }
}

fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), PublishError> {
    if buffer.len() + chunk.len() > limit {
        return Err(too_large(limit));
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

fn error_for_status(status: u16, body: String) -> PublishError {
    match status {
        401 | 403 => PublishError::Unauthorized,
        _ => PublishError::Rejected { status, body },
    }
}

fn cid_from(response: UploadResponse) -> Result<String, PublishError> {
    match response.value {
        Some(value) if response.ok && !value.cid.is_empty() => Ok(value.cid),
        _ => Err(PublishError::InvalidResponse(
            response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "missing cid".to_string()),
        )),
    }
}
