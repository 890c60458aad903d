//! Error type for `lode-store-json`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The persisted file exists but does not parse as the store schema.
  /// Fatal to any auth operation until the file is repaired.
  #[error("user store at {path} is corrupt: {source}")]
  Corrupt {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("password hash error: {0}")]
  PasswordHash(String),
}

impl Error {
  pub fn is_corrupt(&self) -> bool {
    matches!(self, Self::Corrupt { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
