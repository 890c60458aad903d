//! Error types for `lode-core`.
//!
//! These are the recoverable, user-facing failures of the login and
//! registration flows. Storage-integrity failures live with the store
//! backend that detects them.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("username already exists")]
  DuplicateUsername,

  #[error("email already in use")]
  DuplicateEmail,

  #[error("passwords do not match")]
  PasswordMismatch,

  #[error("provide username and password")]
  MissingFields,

  #[error("invalid administrator code")]
  InvalidAdminCode,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
