//! Reconciliation — applies a [`SubscriptionEvent`] to the account store.
//!
//! The sequence is linear: validate the email, resolve or create the
//! identity, then upsert the profile. There are no internal retries; a
//! failed step is reported and the provider's redelivery is the retry.
//!
//! If the profile write fails after an identity was created, the identity
//! stays without a profile. A redelivery finds it and completes the write.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Identity, IdentityMetadata, NewIdentity, Profile},
  event::{Provider, SubscriptionEvent, SubscriptionStatus, Tier},
  store::AccountStore,
};

/// Summary of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
  pub identity_id:      Uuid,
  pub tier:             Tier,
  pub status:           SubscriptionStatus,
  pub source:           Provider,
  /// `true` if this event created the identity.
  pub identity_created: bool,
}

/// Applies canonical events to an [`AccountStore`].
pub struct Reconciler<S> {
  store: Arc<S>,
}

impl<S> Clone for Reconciler<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<S: AccountStore> Reconciler<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn reconcile(
    &self,
    event: SubscriptionEvent,
  ) -> Result<ReconciliationResult> {
    let email = event.customer_email.trim();
    if email.is_empty() {
      return Err(Error::MissingRequiredField("customer email"));
    }

    let (identity, identity_created) =
      self.resolve_identity(email, &event).await?;

    // The profile carries the identity's email as first seen, not this
    // event's casing.
    let profile = Profile {
      identity_id: identity.identity_id,
      email:       identity.email.clone(),
      tier:        event.tier,
      status:      event.status,
      source:      event.provider,
      raw_payload: event.raw_payload,
      updated_at:  Utc::now(),
    };

    self
      .store
      .upsert_profile(profile)
      .await
      .map_err(|e| Error::ProfileWriteFailed(Box::new(e)))?;

    info!(
      identity_id = %identity.identity_id,
      provider = %event.provider,
      tier = %event.tier,
      status = %event.status,
      "profile updated"
    );

    Ok(ReconciliationResult {
      identity_id: identity.identity_id,
      tier: event.tier,
      status: event.status,
      source: event.provider,
      identity_created,
    })
  }

  /// Find the identity for `email`, creating it if absent.
  ///
  /// A failed create is followed by one more lookup: if another request
  /// created the identity in the meantime, that identity is used.
  async fn resolve_identity(
    &self,
    email: &str,
    event: &SubscriptionEvent,
  ) -> Result<(Identity, bool)> {
    let existing = self
      .store
      .find_identity_by_email(email)
      .await
      .map_err(|e| Error::AccountResolutionFailed(Box::new(e)))?;

    if let Some(identity) = existing {
      debug!(identity_id = %identity.identity_id, "existing identity");
      return Ok((identity, false));
    }

    let input = NewIdentity {
      email:           email.to_owned(),
      email_confirmed: true,
      metadata:        IdentityMetadata {
        source: event.provider,
        tier:   event.tier,
      },
    };

    let create_err = match self.store.create_identity(input).await {
      Ok(identity) => {
        info!(
          identity_id = %identity.identity_id,
          provider = %event.provider,
          "created identity"
        );
        return Ok((identity, true));
      }
      Err(e) => e,
    };

    match self.store.find_identity_by_email(email).await {
      Ok(Some(identity)) => {
        warn!(
          identity_id = %identity.identity_id,
          error = %create_err,
          "identity created concurrently; using existing"
        );
        Ok((identity, false))
      }
      Ok(None) => Err(Error::AccountResolutionFailed(Box::new(create_err))),
      Err(lookup_err) => {
        debug!(error = %lookup_err, "lookup after failed create also failed");
        Err(Error::AccountResolutionFailed(Box::new(create_err)))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use serde_json::json;
  use thiserror::Error;

  use super::*;
  use crate::ErrorClass;

  #[derive(Debug, Error)]
  #[error("{0}")]
  struct StoreFailure(&'static str);

  /// In-memory store with failure knobs and a call counter.
  #[derive(Default)]
  struct MemoryStore {
    identities:    Mutex<Vec<Identity>>,
    profiles:      Mutex<Vec<Profile>>,
    calls:         AtomicUsize,
    fail_lookup:   bool,
    fail_create:   bool,
    /// Simulate a concurrent request winning the insert race.
    race_create:   bool,
    fail_upsert:   bool,
  }

  impl MemoryStore {
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn identity_count(&self) -> usize { self.identities.lock().unwrap().len() }

    fn profile_for(&self, id: Uuid) -> Option<Profile> {
      self
        .profiles
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.identity_id == id)
        .cloned()
    }

    fn insert(&self, input: NewIdentity) -> Identity {
      let identity = Identity {
        identity_id:     Uuid::new_v4(),
        email:           input.email,
        email_confirmed: input.email_confirmed,
        metadata:        input.metadata,
        created_at:      Utc::now(),
      };
      self.identities.lock().unwrap().push(identity.clone());
      identity
    }
  }

  impl AccountStore for MemoryStore {
    type Error = StoreFailure;

    async fn find_identity_by_email(
      &self,
      email: &str,
    ) -> Result<Option<Identity>, StoreFailure> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_lookup {
        return Err(StoreFailure("lookup unavailable"));
      }
      Ok(
        self
          .identities
          .lock()
          .unwrap()
          .iter()
          .find(|i| i.email.eq_ignore_ascii_case(email))
          .cloned(),
      )
    }

    async fn create_identity(
      &self,
      input: NewIdentity,
    ) -> Result<Identity, StoreFailure> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_create {
        return Err(StoreFailure("create unavailable"));
      }
      if self.race_create {
        self.insert(input);
        return Err(StoreFailure("email already registered"));
      }
      Ok(self.insert(input))
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<(), StoreFailure> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_upsert {
        return Err(StoreFailure("write rejected"));
      }
      let mut profiles = self.profiles.lock().unwrap();
      profiles.retain(|p| p.identity_id != profile.identity_id);
      profiles.push(profile);
      Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreFailure> {
      Ok(self.profile_for(id))
    }

    async fn find_profile_by_email(
      &self,
      email: &str,
    ) -> Result<Option<Profile>, StoreFailure> {
      Ok(
        self
          .profiles
          .lock()
          .unwrap()
          .iter()
          .find(|p| p.email.eq_ignore_ascii_case(email))
          .cloned(),
      )
    }
  }

  fn event(email: &str, tier: Tier, status: SubscriptionStatus) -> SubscriptionEvent {
    SubscriptionEvent {
      provider: Provider::Kiwify,
      external_product_id: Some("prod_A1".into()),
      customer_email: email.into(),
      tier,
      status,
      raw_payload: json!({ "order_status": status.as_str() }),
    }
  }

  fn reconciler(store: MemoryStore) -> (Arc<MemoryStore>, Reconciler<MemoryStore>) {
    let store = Arc::new(store);
    (Arc::clone(&store), Reconciler::new(store))
  }

  #[tokio::test]
  async fn creates_identity_and_profile() {
    let (store, r) = reconciler(MemoryStore::default());

    let res = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap();

    assert!(res.identity_created);
    assert_eq!(res.tier, Tier::Plus);
    assert_eq!(res.status, SubscriptionStatus::Active);
    assert_eq!(res.source, Provider::Kiwify);

    let identities = store.identities.lock().unwrap().clone();
    assert_eq!(identities.len(), 1);
    assert!(identities[0].email_confirmed);
    assert_eq!(identities[0].metadata, IdentityMetadata {
      source: Provider::Kiwify,
      tier:   Tier::Plus,
    });

    let profile = store.profile_for(res.identity_id).unwrap();
    assert_eq!(profile.email, "a@x.com");
    assert_eq!(profile.source, Provider::Kiwify);
  }

  #[tokio::test]
  async fn empty_email_fails_before_any_store_call() {
    let (store, r) = reconciler(MemoryStore::default());

    for email in ["", "   "] {
      let err = r
        .reconcile(event(email, Tier::Basic, SubscriptionStatus::Active))
        .await
        .unwrap_err();
      assert!(matches!(err, Error::MissingRequiredField(_)));
      assert_eq!(err.class(), ErrorClass::Client);
    }
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn second_event_reuses_identity_and_replaces_profile() {
    let (store, r) = reconciler(MemoryStore::default());

    let first = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap();

    let mut second_ev = event("a@x.com", Tier::Elite, SubscriptionStatus::Inactive);
    second_ev.provider = Provider::Hotmart;
    second_ev.raw_payload = json!({ "event": "PURCHASE_DELAYED" });
    let second = r.reconcile(second_ev.clone()).await.unwrap();

    assert!(!second.identity_created);
    assert_eq!(first.identity_id, second.identity_id);
    assert_eq!(store.identity_count(), 1);

    let profile = store.profile_for(second.identity_id).unwrap();
    assert_eq!(profile.tier, Tier::Elite);
    assert_eq!(profile.status, SubscriptionStatus::Inactive);
    assert_eq!(profile.source, Provider::Hotmart);
    assert_eq!(profile.raw_payload, second_ev.raw_payload);

    // Identity provenance is fixed at creation.
    let identity = store.identities.lock().unwrap()[0].clone();
    assert_eq!(identity.metadata.source, Provider::Kiwify);
  }

  #[tokio::test]
  async fn same_event_twice_is_idempotent() {
    let (store, r) = reconciler(MemoryStore::default());
    let ev = event("a@x.com", Tier::Plus, SubscriptionStatus::Active);

    let a = r.reconcile(ev.clone()).await.unwrap();
    let b = r.reconcile(ev).await.unwrap();

    assert_eq!(a.identity_id, b.identity_id);
    assert_eq!(store.identity_count(), 1);
    assert_eq!(store.profiles.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn email_is_trimmed_before_lookup() {
    let (store, r) = reconciler(MemoryStore::default());
    let a = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap();
    let b = r
      .reconcile(event("  a@x.com ", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap();

    assert_eq!(a.identity_id, b.identity_id);
    assert_eq!(store.identity_count(), 1);
  }

  #[tokio::test]
  async fn profile_email_follows_identity_casing() {
    let (store, r) = reconciler(MemoryStore::default());
    let first = r
      .reconcile(event("Alice@X.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap();
    let second = r
      .reconcile(event("alice@x.com", Tier::Elite, SubscriptionStatus::Active))
      .await
      .unwrap();

    assert_eq!(first.identity_id, second.identity_id);
    let p = store.profile_for(second.identity_id).unwrap();
    assert_eq!(p.email, "Alice@X.com");
    assert_eq!(p.tier, Tier::Elite);
  }

  #[tokio::test]
  async fn creation_race_recovers_existing_identity() {
    let (store, r) = reconciler(MemoryStore {
      race_create: true,
      ..Default::default()
    });

    let res = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap();

    assert!(!res.identity_created);
    assert_eq!(store.identity_count(), 1);
    assert!(store.profile_for(res.identity_id).is_some());
  }

  #[tokio::test]
  async fn failed_create_is_account_resolution_failure() {
    let (store, r) = reconciler(MemoryStore {
      fail_create: true,
      ..Default::default()
    });

    let err = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap_err();

    assert!(matches!(err, Error::AccountResolutionFailed(_)));
    assert_eq!(err.class(), ErrorClass::Server);
    assert!(err.to_string().contains("create unavailable"));
    assert!(store.profiles.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn failed_lookup_is_account_resolution_failure() {
    let (_, r) = reconciler(MemoryStore {
      fail_lookup: true,
      ..Default::default()
    });

    let err = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::AccountResolutionFailed(_)));
  }

  #[tokio::test]
  async fn failed_upsert_leaves_identity_without_profile() {
    let (store, r) = reconciler(MemoryStore {
      fail_upsert: true,
      ..Default::default()
    });

    let err = r
      .reconcile(event("a@x.com", Tier::Plus, SubscriptionStatus::Active))
      .await
      .unwrap_err();

    assert!(matches!(err, Error::ProfileWriteFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(store.identity_count(), 1);
    assert!(store.profiles.lock().unwrap().is_empty());
  }
}
