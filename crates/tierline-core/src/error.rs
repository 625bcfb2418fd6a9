//! Error taxonomy for the webhook pipeline.

use thiserror::Error;

/// Boxed store error carried by the server-side variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// No provider detector matched the payload.
  #[error("unrecognized webhook format")]
  UnrecognizedFormat,

  #[error("missing required field: {0}")]
  MissingRequiredField(&'static str),

  #[error("account resolution failed: {0}")]
  AccountResolutionFailed(#[source] BoxError),

  #[error("profile write failed: {0}")]
  ProfileWriteFailed(#[source] BoxError),
}

/// Which side caused a failure; the transport maps this to a status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  Client,
  Server,
}

impl Error {
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::UnrecognizedFormat | Self::MissingRequiredField(_) => {
        ErrorClass::Client
      }
      Self::AccountResolutionFailed(_) | Self::ProfileWriteFailed(_) => {
        ErrorClass::Server
      }
    }
  }

  /// Whether a provider redelivery of the same payload may succeed.
  ///
  /// Server-side failures are safe to retry: identity lookup finds an
  /// identity created by an earlier attempt, and the profile upsert is keyed
  /// by identity id.
  pub fn is_retryable(&self) -> bool { self.class() == ErrorClass::Server }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
