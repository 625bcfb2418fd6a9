//! Handler for `POST /webhook` and the response contract returned to the
//! billing provider.
//!
//! Client-caused failures (unrecognised shape, missing email, invalid JSON)
//! answer `400` so providers stop redelivering; store failures answer `500`
//! so they retry.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tierline_core::{
  ErrorClass,
  event::{SubscriptionStatus, Tier},
  reconcile::ReconciliationResult,
  store::AccountStore,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Body returned for every webhook request, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tier:    Option<Tier>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:  Option<SubscriptionStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

impl WebhookResponse {
  pub fn success(result: &ReconciliationResult) -> Self {
    Self {
      success: true,
      message: Some(format!(
        "{} webhook processed",
        result.source.display_name()
      )),
      user_id: Some(result.identity_id),
      tier:    Some(result.tier),
      status:  Some(result.status),
      error:   None,
    }
  }

  pub fn failure(error: impl Into<String>) -> Self {
    Self {
      success: false,
      message: None,
      user_id: None,
      tier:    None,
      status:  None,
      error:   Some(error.into()),
    }
  }
}

/// `POST /webhook` — body: any provider's webhook JSON.
pub async fn receive<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError>
where
  S: AccountStore + 'static,
{
  let outcome = process(&state, body).await;

  if let Err(e) = &outcome {
    match e {
      ApiError::Webhook(inner) if inner.class() == ErrorClass::Server => {
        error!(error = %e, retryable = inner.is_retryable(), "webhook failed");
      }
      _ => warn!(error = %e, "webhook rejected"),
    }
  }

  outcome.map(Json)
}

async fn process<S>(
  state: &ApiState<S>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<WebhookResponse, ApiError>
where
  S: AccountStore + 'static,
{
  let Json(raw) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  let event = state.router.normalize(raw)?;
  info!(
    provider = %event.provider,
    email = %event.customer_email,
    product_id = event.external_product_id.as_deref().unwrap_or("-"),
    tier = %event.tier,
    status = %event.status,
    "webhook received"
  );

  let result = state.reconciler.reconcile(event).await?;
  Ok(WebhookResponse::success(&result))
}
