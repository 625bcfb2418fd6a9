//! Read-side handlers over reconciled profiles.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profiles/{id}` | 404 if the identity has no profile |
//! | `GET`  | `/access?email=` | Whether the email holds an active subscription, and its pet limit |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use tierline_core::{
  account::Profile,
  event::{SubscriptionStatus, Tier},
  store::AccountStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /profiles/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: AccountStore + 'static,
{
  let profile = state
    .store
    .get_profile(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}

// ─── Access check ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AccessParams {
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessResponse {
  pub email:      String,
  /// `true` only when a profile exists and its status is active.
  pub authorized: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tier:       Option<Tier>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:     Option<SubscriptionStatus>,
  /// Pets the subscription allows. Absent unless `authorized`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limit:      Option<u32>,
}

/// `GET /access?email=<email>`
pub async fn access<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<AccessParams>, QueryRejection>,
) -> Result<Json<AccessResponse>, ApiError>
where
  S: AccountStore + 'static,
{
  let Query(params) =
    params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let email = params.email.trim();
  if email.is_empty() {
    return Err(ApiError::BadRequest("email must not be empty".into()));
  }

  let profile = state
    .store
    .find_profile_by_email(email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let authorized = profile.as_ref().is_some_and(|p| p.status.is_active());

  Ok(Json(AccessResponse {
    email: email.to_owned(),
    authorized,
    tier: profile.as_ref().map(|p| p.tier),
    status: profile.as_ref().map(|p| p.status),
    limit: profile
      .as_ref()
      .filter(|_| authorized)
      .map(|p| p.tier.pet_limit()),
  }))
}
