//! Event routing — picks the provider adapter for a raw payload.
//!
//! Detection is an ordered list of predicates over top-level fields. The
//! first match wins, so a payload carrying both `Product` and `event` is
//! treated as Kiwify.

use std::sync::Arc;

use serde_json::Value;

use crate::{
  Error, Result,
  catalog::TierCatalog,
  event::{Provider, SubscriptionEvent},
  provider::ProviderEvent,
};

/// A shape detector: returns `true` if the payload belongs to the provider.
type Detector = fn(&Value) -> bool;

fn has_field(raw: &Value, field: &str) -> bool {
  raw.get(field).is_some_and(|v| !v.is_null())
}

fn is_kiwify(raw: &Value) -> bool { has_field(raw, "Product") }

fn is_hotmart(raw: &Value) -> bool { has_field(raw, "event") }

/// Detectors in precedence order.
const DETECTORS: [(Provider, Detector); 2] = [
  (Provider::Kiwify, is_kiwify),
  (Provider::Hotmart, is_hotmart),
];

/// Return the provider whose detector matches `raw`, if any.
pub fn detect(raw: &Value) -> Option<Provider> {
  DETECTORS
    .iter()
    .find(|(_, matches)| matches(raw))
    .map(|(provider, _)| *provider)
}

/// Routes raw payloads to provider adapters and normalises them using the
/// injected tier catalog.
///
/// Cloning is cheap — the catalog is reference-counted.
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
  catalog: Arc<TierCatalog>,
}

impl EventRouter {
  pub fn new(catalog: Arc<TierCatalog>) -> Self { Self { catalog } }

  /// Select and read the matching provider payload.
  ///
  /// Fails with [`Error::UnrecognizedFormat`] when no detector matches.
  pub fn route(&self, raw: &Value) -> Result<ProviderEvent> {
    let provider = detect(raw).ok_or(Error::UnrecognizedFormat)?;
    Ok(ProviderEvent::parse(provider, raw))
  }

  /// Route `raw` and normalise it into a [`SubscriptionEvent`].
  pub fn normalize(&self, raw: Value) -> Result<SubscriptionEvent> {
    let routed = self.route(&raw)?;
    routed.normalize(raw, &self.catalog)
  }
}
