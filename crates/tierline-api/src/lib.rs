//! HTTP surface for tierline.
//!
//! Exposes an axum [`Router`] backed by any
//! [`tierline_core::store::AccountStore`]. CORS, TLS, and request tracing are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = tierline_api::api_router(store.clone(), catalog.clone());
//! ```

pub mod error;
pub mod profiles;
pub mod webhook;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tierline_core::{
  catalog::TierCatalog, reconcile::Reconciler, router::EventRouter,
  store::AccountStore,
};

pub use error::ApiError;
pub use webhook::WebhookResponse;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers. Everything in it is read-only
/// after startup.
pub struct ApiState<S> {
  pub router:     EventRouter,
  pub reconciler: Reconciler<S>,
  pub store:      Arc<S>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      router:     self.router.clone(),
      reconciler: self.reconciler.clone(),
      store:      Arc::clone(&self.store),
    }
  }
}

impl<S: AccountStore> ApiState<S> {
  pub fn new(store: Arc<S>, catalog: Arc<TierCatalog>) -> Self {
    Self {
      router: EventRouter::new(catalog),
      reconciler: Reconciler::new(Arc::clone(&store)),
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `store`, classifying products with `catalog`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, catalog: Arc<TierCatalog>) -> Router<()>
where
  S: AccountStore + 'static,
{
  Router::new()
    .route("/webhook", post(webhook::receive::<S>))
    .route("/profiles/{id}", get(profiles::get_one::<S>))
    .route("/access", get(profiles::access::<S>))
    .with_state(ApiState::new(store, catalog))
}

// ─── Integration tests ────────────────────────────────────────────────────────
