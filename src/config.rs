//!
//! forkful configuration
//! ----------------------
//! Settings are read from environment variables; the server binary layers its
//! command-line flags on top. Secrets (token audience/issuer, image hosting
//! credentials) have no defaults and must be provided.

use anyhow::{anyhow, Result};
use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 7000;
pub const DEFAULT_DB_FOLDER: &str = "dbs";
pub const DEFAULT_SNAPSHOT_INTERVAL_MS: u64 = 5_000;
/// Shorter intervals are raised to this floor.
pub const MIN_SNAPSHOT_INTERVAL_MS: u64 = 100;

/// Token verifier settings: which audience/issuer a bearer token must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub audience: String,
    pub issuer_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub db_root: String,
    pub snapshot_interval: Duration,
    pub auth: AuthConfig,
    pub cloudinary: CloudinaryConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing required environment variable {}", name))
        };
        let http_port = match lookup("FORKFUL_HTTP_PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| anyhow!("FORKFUL_HTTP_PORT is not a valid port: {}", v))?,
            None => DEFAULT_HTTP_PORT,
        };
        let db_root = lookup("FORKFUL_DB_FOLDER").unwrap_or_else(|| DEFAULT_DB_FOLDER.to_string());
        let interval_ms = lookup("FORKFUL_SNAPSHOT_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_SNAPSHOT_INTERVAL_MS)
            .max(MIN_SNAPSHOT_INTERVAL_MS);

        Ok(Self {
            http_port,
            db_root,
            snapshot_interval: Duration::from_millis(interval_ms),
            auth: AuthConfig {
                audience: required("AUTH0_AUDIENCE")?,
                issuer_base_url: required("AUTH0_ISSUER_BASE_URL")?,
            },
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            },
        })
    }
}
