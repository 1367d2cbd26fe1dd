use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::extract::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::{current_user, provision_account, update_profile, IdentityContext, NewAccount, ProfileUpdate, ProvisionOutcome, VerifiedSubject};
use crate::models::User;

pub async fn get_current_user(State(state): State<AppState>, Extension(ctx): Extension<IdentityContext>) -> AppResult<Json<User>> {
    current_user(&state.store, &ctx).map(Json).map_err(|e| e.masked("Something went wrong"))
}

/// 201 with the new account, or 200 with no body when it already exists.
pub async fn create_current_user(
    State(state): State<AppState>,
    Extension(VerifiedSubject(subject)): Extension<VerifiedSubject>,
    ApiJson(payload): ApiJson<NewAccount>,
) -> AppResult<Response> {
    match provision_account(&state.store, &subject, payload) {
        Ok(ProvisionOutcome::Created(user)) => Ok((StatusCode::CREATED, Json(user)).into_response()),
        Ok(ProvisionOutcome::AlreadyProvisioned) => Ok(StatusCode::OK.into_response()),
        Err(e @ AppError::Auth { .. }) => Err(e),
        Err(e) => Err(AppError::internal(e.code_str().to_string(), e.message().to_string()).masked("Error creating user")),
    }
}

pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<IdentityContext>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> AppResult<Json<User>> {
    update_profile(&state.store, &ctx, update).map(Json).map_err(|e| e.masked("Error updating user"))
}
