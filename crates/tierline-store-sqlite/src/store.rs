//! [`SqliteStore`] — the SQLite implementation of [`AccountStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tierline_core::{
  account::{Identity, NewIdentity, Profile},
  store::AccountStore,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawIdentity, RawProfile, encode_dt, encode_uuid},
  schema::SCHEMA,
};

const PROFILE_COLUMNS: &str = "p.identity_id, p.email, p.tier, p.status, \
                               p.source, p.raw_payload, p.updated_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// An account store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored identities.
  pub async fn count_identities(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM identities", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as u64)
  }

  /// Run a profile query whose single parameter is `key`.
  async fn query_profile(
    &self,
    where_clause: &'static str,
    key: String,
  ) -> Result<Option<Profile>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PROFILE_COLUMNS}
           FROM profiles p
           JOIN identities i ON i.identity_id = p.identity_id
           WHERE {where_clause}"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key], RawProfile::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
    let email = email.to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM identities WHERE email = ?1",
          RawIdentity::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![email], RawIdentity::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn create_identity(&self, input: NewIdentity) -> Result<Identity> {
    let identity = Identity {
      identity_id:     Uuid::new_v4(),
      email:           input.email,
      email_confirmed: input.email_confirmed,
      metadata:        input.metadata,
      created_at:      Utc::now(),
    };

    let id_str       = encode_uuid(identity.identity_id);
    let email        = identity.email.clone();
    let confirmed    = identity.email_confirmed;
    let metadata_str = serde_json::to_string(&identity.metadata)?;
    let at_str       = encode_dt(identity.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO identities (identity_id, email, email_confirmed, metadata, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, confirmed, metadata_str, at_str],
        );
        match res {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(identity.email));
    }
    Ok(identity)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn upsert_profile(&self, profile: Profile) -> Result<()> {
    let id_str      = encode_uuid(profile.identity_id);
    let email       = profile.email;
    let tier        = profile.tier.as_str();
    let status      = profile.status.as_str();
    let source      = profile.source.as_str();
    let payload_str = serde_json::to_string(&profile.raw_payload)?;
    let at_str      = encode_dt(profile.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (
             identity_id, email, tier, status, source, raw_payload, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (identity_id) DO UPDATE SET
             email       = excluded.email,
             tier        = excluded.tier,
             status      = excluded.status,
             source      = excluded.source,
             raw_payload = excluded.raw_payload,
             updated_at  = excluded.updated_at",
          rusqlite::params![id_str, email, tier, status, source, payload_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_profile(&self, identity_id: Uuid) -> Result<Option<Profile>> {
    self
      .query_profile("p.identity_id = ?1", encode_uuid(identity_id))
      .await
  }

  async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    self.query_profile("i.email = ?1", email.to_owned()).await
  }
}
