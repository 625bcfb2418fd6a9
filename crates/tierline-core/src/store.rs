//! The `AccountStore` trait.
//!
//! Implemented by storage backends (e.g. `tierline-store-sqlite`). The
//! reconciler and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::account::{Identity, NewIdentity, Profile};

/// Abstraction over identity and profile storage.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Look up an identity by email. Returns `None` if none exists.
  fn find_identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Create and persist a new identity.
  ///
  /// Returns an error if an identity with the same email already exists or
  /// the store is unreachable.
  fn create_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Insert `profile`, or replace every field of the existing profile with
  /// the same `identity_id`.
  fn upsert_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve the profile for an identity. Returns `None` if not found.
  fn get_profile(
    &self,
    identity_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Retrieve the profile of the identity with this email, if any.
  fn find_profile_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;
}
