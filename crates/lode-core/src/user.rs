//! Account records.
//!
//! A user is created by registration and removed by deletion; there is no
//! edit path. Ids are assigned monotonically by the store and are stable
//! for the account's lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The id reserved for the administrator account seeded on first
/// initialisation of a user store.
pub const SEED_ADMIN_ID: u64 = 1;

/// The email domain used when registration leaves the email blank.
pub const DEFAULT_EMAIL_DOMAIN: &str = "minerals.local";

/// A persisted account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:            u64,
  pub username:      String,
  /// PHC string produced by a memory-hard hash, e.g. `$argon2id$v=19$…`.
  pub password_hash: String,
  pub role:          Role,
  pub email:         String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::UserStore::create_user`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  /// Plaintext; hashed by the store before anything is persisted.
  pub password: String,
  pub role:     Role,
  /// Blank means "default to `<username>@minerals.local`".
  pub email:    String,
}

/// The externally-visible shape of a [`User`]: everything but the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
  pub id:         u64,
  pub username:   String,
  pub role:       Role,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
  fn from(user: User) -> Self {
    Self {
      id:         user.id,
      username:   user.username,
      role:       user.role,
      email:      user.email,
      created_at: user.created_at,
    }
  }
}

/// The email applied when registration leaves the field blank.
pub fn default_email(username: &str) -> String {
  format!("{username}@{DEFAULT_EMAIL_DOMAIN}")
}
