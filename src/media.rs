//! Image hosting adapter. Restaurant images are pushed to Cloudinary and only
//! the returned URL is stored.

use std::fmt::Write as _;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CloudinaryConfig;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image host unreachable: {0}")]
    Transport(String),
    #[error("image host rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("image host response carried no url")]
    MissingUrl,
}

#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload raw bytes and return the hosted URL.
    async fn upload(&self, bytes: Vec<u8>, mime: &str) -> Result<String, UploadError>;
}

/// `data:<mime>;base64,<payload>`
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Hex SHA-256 over `timestamp=<ts><secret>`, the only signed parameter of an upload.
pub fn upload_signature(timestamp: i64, api_secret: &str) -> String {
    let digest = Sha256::digest(format!("timestamp={}{}", timestamp, api_secret).as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() { let _ = write!(&mut out, "{:02x}", b); }
    out
}

pub struct CloudinaryUploader {
    cfg: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryUploader {
    pub fn new(cfg: CloudinaryConfig) -> Self { Self { cfg, client: reqwest::Client::new() } }

    pub fn endpoint(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.cfg.cloud_name)
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, bytes: Vec<u8>, mime: &str) -> Result<String, UploadError> {
        let timestamp = chrono::Utc::now().timestamp();
        let size = bytes.len();
        let form = reqwest::multipart::Form::new()
            .text("file", data_uri(mime, &bytes))
            .text("api_key", self.cfg.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", upload_signature(timestamp, &self.cfg.api_secret))
            .text("signature_algorithm", "sha256");
        let resp = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(target: "forkful::media", status = status.as_u16(), "upload rejected");
            return Err(UploadError::Rejected { status: status.as_u16(), body });
        }
        let json: serde_json::Value = resp.json().await.map_err(|e| UploadError::Transport(e.to_string()))?;
        let url = json.get("url").and_then(|v| v.as_str()).ok_or(UploadError::MissingUrl)?;
        debug!(target: "forkful::media", bytes = size, mime = %mime, "image uploaded: {}", url);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_wraps_base64_payload() {
        assert_eq!(data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
        assert_eq!(data_uri("image/jpeg", b""), "data:image/jpeg;base64,");
    }

    #[test]
    fn signature_is_sha256_hex_of_timestamp_and_secret() {
        let sig = upload_signature(1_700_000_000, "s3cret");
        let expected = Sha256::digest(b"timestamp=1700000000s3cret");
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, expected.iter().map(|b| format!("{:02x}", b)).collect::<String>());
        assert_ne!(sig, upload_signature(1_700_000_001, "s3cret"));
    }

    #[test]
    fn endpoint_uses_cloud_name() {
        let up = CloudinaryUploader::new(CloudinaryConfig { cloud_name: "demo".into(), api_key: "k".into(), api_secret: "s".into() });
        assert_eq!(up.endpoint(), "https://api.cloudinary.com/v1_1/demo/image/upload");
    }
}
