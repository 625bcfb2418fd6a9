//! Error type for `tierline-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value this build does not know.
  #[error("decode error: {0}")]
  Decode(String),

  /// The unique constraint on `identities.email` rejected an insert.
  #[error("an identity with email {0:?} already exists")]
  EmailTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
