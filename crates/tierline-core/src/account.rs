//! Account records owned by the account store: identities and profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{Provider, SubscriptionStatus, Tier};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Provenance attached to an identity when it is first created.
/// Never rewritten by later events; the profile carries current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMetadata {
  pub source: Provider,
  pub tier:   Tier,
}

/// A user identity. At most one exists per email (case-insensitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:     Uuid,
  pub email:           String,
  /// Identities created from a paid webhook skip email confirmation.
  pub email_confirmed: bool,
  pub metadata:        IdentityMetadata,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::create_identity`].
/// `identity_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub email:           String,
  pub email_confirmed: bool,
  pub metadata:        IdentityMetadata,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Current subscription state for an identity, keyed by `identity_id`.
///
/// Every upsert replaces all fields; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub identity_id: Uuid,
  pub email:       String,
  pub tier:        Tier,
  pub status:      SubscriptionStatus,
  pub source:      Provider,
  /// The webhook body that produced this state.
  pub raw_payload: serde_json::Value,
  pub updated_at:  DateTime<Utc>,
}
