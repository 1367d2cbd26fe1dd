use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing or non-bearer authorization header")]
    MissingBearer,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token rejected: {0}")]
    Invalid(String),
    #[error("no signing key with kid '{0}'")]
    UnknownKey(String),
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
}

/// Checks a bearer token's signature, audience, issuer and expiry.
/// Implementations never look at accounts; that happens after verification.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), TokenError>;
}

/// Issuer claims carry the base URL with a trailing slash.
pub fn normalize_issuer(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{}/", trimmed) }
}

fn validation_for(alg: Algorithm, audience: &str, issuer: &str) -> Validation {
    let mut validation = Validation::new(alg);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer]);
    validation
}

/// RS256 verifier backed by the identity provider's published JWKS.
/// Keys are cached by `kid`; an unknown `kid` triggers one refetch.
pub struct JwksVerifier {
    audience: String,
    issuer: String,
    jwks_url: String,
    client: reqwest::Client,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl JwksVerifier {
    pub fn new(cfg: &AuthConfig) -> Self {
        let issuer = normalize_issuer(&cfg.issuer_base_url);
        let jwks_url = format!("{}.well-known/jwks.json", issuer);
        Self {
            audience: cfg.audience.clone(),
            issuer,
            jwks_url,
            client: reqwest::Client::new(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn jwks_url(&self) -> &str { &self.jwks_url }

    fn cached_key(&self, kid: &str) -> Option<DecodingKey> { self.keys.read().get(kid).cloned() }

    async fn refresh_keys(&self) -> Result<(), TokenError> {
        let set: JwkSet = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TokenError::KeysUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| TokenError::KeysUnavailable(e.to_string()))?;
        let mut fresh = HashMap::new();
        for jwk in set.keys.iter() {
            let Some(kid) = jwk.common.key_id.clone() else { continue; };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => { fresh.insert(kid, key); }
                Err(e) => debug!(target: "forkful::auth", kid = %kid, "skipping unusable jwk: {}", e),
            }
        }
        info!(target: "forkful::auth", "loaded {} signing keys from {}", fresh.len(), self.jwks_url);
        *self.keys.write() = fresh;
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<(), TokenError> {
        let header = decode_header(token).map_err(|e| TokenError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenError::Invalid(format!("unexpected signing algorithm {:?}", header.alg)));
        }
        let kid = header.kid.ok_or_else(|| TokenError::Malformed("missing kid header".into()))?;
        let key = match self.cached_key(&kid) {
            Some(k) => k,
            None => {
                self.refresh_keys().await?;
                self.cached_key(&kid).ok_or_else(|| TokenError::UnknownKey(kid.clone()))?
            }
        };
        let validation = validation_for(Algorithm::RS256, &self.audience, &self.issuer);
        decode::<serde_json::Value>(token, &key, &validation).map_err(|e| TokenError::Invalid(e.to_string()))?;
        Ok(())
    }
}

/// HS256 verifier with a shared secret, for local development and tests.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    audience: String,
    issuer: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: &[u8], audience: &str, issuer_base_url: &str) -> Self {
        Self { key: DecodingKey::from_secret(secret), audience: audience.to_string(), issuer: normalize_issuer(issuer_base_url) }
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<(), TokenError> {
        let validation = validation_for(Algorithm::HS256, &self.audience, &self.issuer);
        decode::<serde_json::Value>(token, &self.key, &validation).map_err(|e| TokenError::Invalid(e.to_string()))?;
        Ok(())
    }
}
