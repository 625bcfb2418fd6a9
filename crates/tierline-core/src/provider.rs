//! Provider adapters.
//!
//! Each supported billing platform has a typed payload shape and a
//! normalisation into [`SubscriptionEvent`]. The set is closed: adding a
//! provider means adding a [`ProviderEvent`] variant and a detector in
//! [`crate::router`].

use serde_json::Value;

use crate::{
  Error, Result,
  catalog::TierCatalog,
  event::{Provider, SubscriptionEvent, SubscriptionStatus},
};

// ─── Shared field helpers ────────────────────────────────────────────────────

/// A provider product id. Kiwify sends strings; Hotmart sends integers.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalId {
  Text(String),
  Number(serde_json::Number),
}

impl ExternalId {
  /// Any other JSON type is treated as an absent id.
  fn from_value(v: &Value) -> Option<Self> {
    match v {
      Value::String(s) => Some(Self::Text(s.clone())),
      Value::Number(n) => Some(Self::Number(n.clone())),
      _ => None,
    }
  }

  fn into_string(self) -> String {
    match self {
      Self::Text(s) => s,
      Self::Number(n) => n.to_string(),
    }
  }
}

/// Read a string at a JSON pointer. Anything not reachable as a string
/// reads as `None`.
fn str_at(raw: &Value, pointer: &str) -> Option<String> {
  raw.pointer(pointer).and_then(Value::as_str).map(str::to_owned)
}

fn require_email(email: Option<String>) -> Result<String> {
  email
    .map(|e| e.trim().to_owned())
    .filter(|e| !e.is_empty())
    .ok_or(Error::MissingRequiredField("customer email"))
}

// ─── Kiwify ──────────────────────────────────────────────────────────────────

/// Kiwify order webhook. Only the fields the pipeline reads are extracted:
/// `Product.id`, `Customer.email` and `order_status`.
#[derive(Debug, Clone, Default)]
pub struct KiwifyEvent {
  pub product_id:     Option<ExternalId>,
  pub customer_email: Option<String>,
  pub order_status:   Option<String>,
}

impl KiwifyEvent {
  pub fn from_value(raw: &Value) -> Self {
    Self {
      product_id:     raw.pointer("/Product/id").and_then(ExternalId::from_value),
      customer_email: str_at(raw, "/Customer/email"),
      order_status:   str_at(raw, "/order_status"),
    }
  }
}

/// `paid` is the only active order status; Kiwify never reports a
/// cancellation through this field.
pub fn kiwify_status(order_status: Option<&str>) -> SubscriptionStatus {
  match order_status {
    Some("paid") => SubscriptionStatus::Active,
    _ => SubscriptionStatus::Inactive,
  }
}

// ─── Hotmart ─────────────────────────────────────────────────────────────────

/// Hotmart purchase webhook (`{"event": ..., "data": {...}}`).
#[derive(Debug, Clone, Default)]
pub struct HotmartEvent {
  pub event:       Option<String>,
  pub product_id:  Option<ExternalId>,
  pub buyer_email: Option<String>,
}

impl HotmartEvent {
  pub fn from_value(raw: &Value) -> Self {
    Self {
      event:       str_at(raw, "/event"),
      product_id:  raw
        .pointer("/data/product/id")
        .and_then(ExternalId::from_value),
      buyer_email: str_at(raw, "/data/buyer/email"),
    }
  }
}

pub fn hotmart_status(event: Option<&str>) -> SubscriptionStatus {
  match event {
    Some("PURCHASE_APPROVED") => SubscriptionStatus::Active,
    Some("PURCHASE_CANCELED" | "PURCHASE_REFUNDED") => {
      SubscriptionStatus::Canceled
    }
    _ => SubscriptionStatus::Inactive,
  }
}

// ─── ProviderEvent ───────────────────────────────────────────────────────────

/// A payload that has been matched to a provider and read into its shape.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
  Kiwify(KiwifyEvent),
  Hotmart(HotmartEvent),
}

impl ProviderEvent {
  /// Read `raw` as `provider`'s payload shape. Fields of an unexpected type
  /// read as absent; only the email is ever required, in [`Self::normalize`].
  pub fn parse(provider: Provider, raw: &Value) -> Self {
    match provider {
      Provider::Kiwify => Self::Kiwify(KiwifyEvent::from_value(raw)),
      Provider::Hotmart => Self::Hotmart(HotmartEvent::from_value(raw)),
    }
  }

  pub fn provider(&self) -> Provider {
    match self {
      Self::Kiwify(_) => Provider::Kiwify,
      Self::Hotmart(_) => Provider::Hotmart,
    }
  }

  /// Map to the canonical event. `raw` is kept verbatim on the result.
  pub fn normalize(
    self,
    raw: Value,
    catalog: &TierCatalog,
  ) -> Result<SubscriptionEvent> {
    let provider = self.provider();

    let (product_id, email, status) = match self {
      Self::Kiwify(ev) => (
        ev.product_id,
        ev.customer_email,
        kiwify_status(ev.order_status.as_deref()),
      ),
      Self::Hotmart(ev) => (
        ev.product_id,
        ev.buyer_email,
        hotmart_status(ev.event.as_deref()),
      ),
    };

    let customer_email = require_email(email)?;
    let external_product_id = product_id.map(ExternalId::into_string);
    let tier = catalog.tier_for(provider, external_product_id.as_deref());

    Ok(SubscriptionEvent {
      provider,
      external_product_id,
      customer_email,
      tier,
      status,
      raw_payload: raw,
    })
  }
}
