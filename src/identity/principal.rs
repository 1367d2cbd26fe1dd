use base64::Engine;
use serde::Deserialize;

use super::provider::TokenError;

/// The subset of token claims forkful reads after verification.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
}

/// Read the `sub` claim from a compact JWS without checking its signature.
/// Signature, audience and issuer checks belong to the `TokenVerifier`, which must run first.
pub fn decode_subject(token: &str) -> Result<String, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::Malformed("expected three dot-separated segments".into()));
    };
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Malformed(format!("payload is not base64url: {}", e)))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("payload is not a claims object: {}", e)))?;
    match claims.sub {
        Some(sub) if !sub.is_empty() => Ok(sub),
        _ => Err(TokenError::Malformed("missing sub claim".into())),
    }
}
