//! Account provisioning and profile maintenance.
//!
//! Provisioning is idempotent per external identity. The first call creates the
//! account; every later call (including one that loses an insert race) reports
//! `AlreadyProvisioned`. The store's unique index on `auth0Id` decides races, so
//! no lock is held across the lookup and the insert.

use serde::Deserialize;
use tracing::{debug, info};

use super::request_context::IdentityContext;
use crate::error::{AppError, AppResult};
use crate::models::{new_object_id, User};
use crate::storage::{IdentityStore, StoreError};

/// Body of `POST /api/my/user`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAccount {
    pub auth0_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Body of `PUT /api/my/user`. Every field is written; an omitted one is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created(User),
    AlreadyProvisioned,
}

/// Create the account bound to `subject` unless one already exists.
///
/// `payload.auth0_id`, when present, must name the verified subject; a mismatch
/// is an authentication failure rather than a way to provision someone else.
pub fn provision_account<S: IdentityStore + ?Sized>(
    store: &S,
    subject: &str,
    payload: NewAccount,
) -> AppResult<ProvisionOutcome> {
    if let Some(claimed) = payload.auth0_id.as_deref() {
        if claimed != subject {
            debug!(target: "forkful::auth", sub = %subject, claimed = %claimed, "provisioning for a foreign identity refused");
            return Err(AppError::unauthorized());
        }
    }
    if store.find_user_by_auth0_id(subject)?.is_some() {
        return Ok(ProvisionOutcome::AlreadyProvisioned);
    }
    let user = User {
        id: new_object_id()?,
        auth0_id: subject.to_string(),
        email: payload.email,
        name: payload.name,
        address_line1: payload.address_line1,
        city: payload.city,
        country: payload.country,
    };
    match store.insert_user(user) {
        Ok(created) => {
            info!(target: "forkful::auth", sub = %subject, user = %created.id, "account provisioned");
            Ok(ProvisionOutcome::Created(created))
        }
        Err(StoreError::DuplicateKey { index: "auth0Id", .. }) => {
            debug!(target: "forkful::auth", sub = %subject, "lost provisioning race; account exists");
            Ok(ProvisionOutcome::AlreadyProvisioned)
        }
        Err(e) => Err(e.into()),
    }
}

fn user_not_found() -> AppError { AppError::not_found("user_not_found", "User not found") }

/// The account the request resolved to.
pub fn current_user<S: IdentityStore + ?Sized>(store: &S, ctx: &IdentityContext) -> AppResult<User> {
    store.find_user(&ctx.user_id)?.ok_or_else(user_not_found)
}

/// Overwrite the mutable profile fields of the caller's account.
pub fn update_profile<S: IdentityStore + ?Sized>(
    store: &S,
    ctx: &IdentityContext,
    update: ProfileUpdate,
) -> AppResult<User> {
    let mut user = current_user(store, ctx)?;
    user.name = update.name;
    user.address_line1 = update.address_line1;
    user.city = update.city;
    user.country = update.country;
    match store.update_user(&user) {
        Ok(saved) => Ok(saved),
        Err(StoreError::NotFound { .. }) => Err(user_not_found()),
        Err(e) => Err(e.into()),
    }
}
