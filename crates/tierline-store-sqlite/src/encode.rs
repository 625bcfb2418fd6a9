//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! structured values compact JSON.

use chrono::{DateTime, Utc};
use tierline_core::{
  account::{Identity, Profile},
  event::{Provider, SubscriptionStatus, Tier},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_provider(s: &str) -> Result<Provider> {
  match s {
    "kiwify" => Ok(Provider::Kiwify),
    "hotmart" => Ok(Provider::Hotmart),
    other => Err(Error::Decode(format!("unknown provider: {other:?}"))),
  }
}

pub fn decode_tier(s: &str) -> Result<Tier> {
  match s {
    "basic" => Ok(Tier::Basic),
    "plus" => Ok(Tier::Plus),
    "elite" => Ok(Tier::Elite),
    other => Err(Error::Decode(format!("unknown tier: {other:?}"))),
  }
}

pub fn decode_status(s: &str) -> Result<SubscriptionStatus> {
  match s {
    "active" => Ok(SubscriptionStatus::Active),
    "inactive" => Ok(SubscriptionStatus::Inactive),
    "canceled" => Ok(SubscriptionStatus::Canceled),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:     String,
  pub email:           String,
  pub email_confirmed: bool,
  pub metadata:        String,
  pub created_at:      String,
}

impl RawIdentity {
  pub const COLUMNS: &'static str =
    "identity_id, email, email_confirmed, metadata, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:     row.get(0)?,
      email:           row.get(1)?,
      email_confirmed: row.get(2)?,
      metadata:        row.get(3)?,
      created_at:      row.get(4)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:     decode_uuid(&self.identity_id)?,
      email:           self.email,
      email_confirmed: self.email_confirmed,
      metadata:        serde_json::from_str(&self.metadata)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub identity_id: String,
  pub email:       String,
  pub tier:        String,
  pub status:      String,
  pub source:      String,
  pub raw_payload: String,
  pub updated_at:  String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id: row.get(0)?,
      email:       row.get(1)?,
      tier:        row.get(2)?,
      status:      row.get(3)?,
      source:      row.get(4)?,
      raw_payload: row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      identity_id: decode_uuid(&self.identity_id)?,
      email:       self.email,
      tier:        decode_tier(&self.tier)?,
      status:      decode_status(&self.status)?,
      source:      decode_provider(&self.source)?,
      raw_payload: serde_json::from_str(&self.raw_payload)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enum_columns_match_core_strings() {
    for p in [Provider::Kiwify, Provider::Hotmart] {
      assert_eq!(decode_provider(p.as_str()).unwrap(), p);
    }
    for t in [Tier::Basic, Tier::Plus, Tier::Elite] {
      assert_eq!(decode_tier(t.as_str()).unwrap(), t);
    }
    for s in [
      SubscriptionStatus::Active,
      SubscriptionStatus::Inactive,
      SubscriptionStatus::Canceled,
    ] {
      assert_eq!(decode_status(s.as_str()).unwrap(), s);
    }
  }

  #[test]
  fn unknown_values_are_decode_errors() {
    assert!(matches!(decode_tier("Essencial"), Err(Error::Decode(_))));
    assert!(matches!(decode_status("ativo"), Err(Error::Decode(_))));
    assert!(matches!(decode_provider("stripe"), Err(Error::Decode(_))));
  }
}
