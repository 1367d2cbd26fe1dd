use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use super::principal::decode_subject;
use super::provider::{TokenError, TokenVerifier};
use super::request_context::{IdentityContext, VerifiedSubject};
use crate::error::{AppError, AppResult};
use crate::server::AppState;
use crate::storage::IdentityStore;
use crate::tprintln;

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let raw = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).ok_or(TokenError::MissingBearer)?;
    let token = raw.strip_prefix("Bearer ").ok_or(TokenError::MissingBearer)?;
    let token = token.split(' ').next().unwrap_or_default();
    if token.is_empty() { return Err(TokenError::MissingBearer); }
    Ok(token)
}

async fn subject_from_headers(verifier: &dyn TokenVerifier, headers: &HeaderMap) -> Result<String, TokenError> {
    let token = bearer_token(headers)?;
    verifier.verify(token).await?;
    decode_subject(token)
}

/// Verify the bearer token and return its subject. Every failure is the same 401.
pub async fn verified_subject(verifier: &dyn TokenVerifier, headers: &HeaderMap) -> AppResult<String> {
    subject_from_headers(verifier, headers).await.map_err(|e| {
        debug!(target: "forkful::auth", "token rejected: {}", e);
        AppError::unauthorized()
    })
}

/// Map a verified subject onto its account.
/// A missing account and a failing store both surface as the same 401.
pub fn resolve_identity<S: IdentityStore + ?Sized>(store: &S, subject: &str) -> AppResult<IdentityContext> {
    match store.find_user_by_auth0_id(subject) {
        Ok(Some(user)) => {
            tprintln!("auth.resolve sub={} user={}", subject, user.id);
            Ok(IdentityContext { auth0_id: subject.to_string(), user_id: user.id })
        }
        Ok(None) => {
            debug!(target: "forkful::auth", sub = %subject, "no account bound to subject");
            Err(AppError::unauthorized())
        }
        Err(e) => {
            debug!(target: "forkful::auth", sub = %subject, "account lookup failed: {}", e);
            Err(AppError::unauthorized())
        }
    }
}

/// Full chain: bearer header, token verification, subject decode, account lookup.
/// The header check runs first so requests without a bearer token never reach the store.
pub async fn authenticate<S: IdentityStore + ?Sized>(
    verifier: &dyn TokenVerifier,
    store: &S,
    headers: &HeaderMap,
) -> AppResult<IdentityContext> {
    let subject = verified_subject(verifier, headers).await?;
    resolve_identity(store, &subject)
}

/// Route layer for endpoints that need a provisioned account.
pub async fn require_identity(State(state): State<AppState>, mut req: Request, next: Next) -> AppResult<Response> {
    let ctx = authenticate(state.verifier.as_ref(), &state.store, req.headers()).await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Route layer for endpoints that only need a verified token (account may not exist yet).
pub async fn require_token(State(state): State<AppState>, mut req: Request, next: Next) -> AppResult<Response> {
    let subject = verified_subject(state.verifier.as_ref(), req.headers()).await?;
    req.extensions_mut().insert(VerifiedSubject(subject));
    Ok(next.run(req).await)
}
