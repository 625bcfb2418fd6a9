//! Transport layer for tierline: configuration and the HTTP application.
//!
//! The API router from `tierline-api` is wrapped with CORS handling (so
//! browser preflights never reach the webhook pipeline) and request
//! tracing.

pub mod config;

use std::sync::Arc;

use axum::{
  Router,
  http::{Method, header},
};
use tierline_core::{catalog::TierCatalog, store::AccountStore};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

pub use config::ServerConfig;

/// Build the full application: API routes plus transport layers.
pub fn app<S>(store: Arc<S>, catalog: Arc<TierCatalog>) -> Router
where
  S: AccountStore + 'static,
{
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

  tierline_api::api_router(store, catalog)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}
