//! The canonical subscription event — the single shape every provider
//! payload is normalised into before reconciliation.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Provenance ──────────────────────────────────────────────────────────────

/// The billing platform an event came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
  Kiwify,
  Hotmart,
}

impl Provider {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Kiwify => "kiwify",
      Self::Hotmart => "hotmart",
    }
  }

  /// Human-readable platform name used in response messages.
  pub fn display_name(self) -> &'static str {
    match self {
      Self::Kiwify => "Kiwify",
      Self::Hotmart => "Hotmart",
    }
  }
}

impl fmt::Display for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// Subscription plan level.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  #[default]
  Basic,
  Plus,
  Elite,
}

impl Tier {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Basic => "basic",
      Self::Plus => "plus",
      Self::Elite => "elite",
    }
  }

  /// Number of pets an active subscription at this tier may register.
  pub const fn pet_limit(self) -> u32 {
    match self {
      Self::Basic => 1,
      Self::Plus => 4,
      Self::Elite => 15,
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
  Active,
  Inactive,
  Canceled,
}

impl SubscriptionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Inactive => "inactive",
      Self::Canceled => "canceled",
    }
  }

  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

impl fmt::Display for SubscriptionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── SubscriptionEvent ───────────────────────────────────────────────────────

/// A provider-agnostic subscription state change.
///
/// Produced by [`crate::provider::ProviderEvent::normalize`] and consumed by
/// [`crate::reconcile::Reconciler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
  pub provider:            Provider,
  pub external_product_id: Option<String>,
  /// Natural key for identity resolution; never empty once normalised.
  pub customer_email:      String,
  pub tier:                Tier,
  pub status:              SubscriptionStatus,
  /// The request body exactly as received, kept for audit.
  pub raw_payload:         serde_json::Value,
}
