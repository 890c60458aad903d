//! [`JsonUserStore`]: the file-backed implementation of [`UserStore`].

use std::path::{Path, PathBuf};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use lode_core::{
  role::Role,
  store::UserStore,
  user::{NewUser, User, default_email},
};

use crate::{Error, Result};

pub const SEED_ADMIN_USERNAME: &str = "admin";
/// The seed account's initial password. Change it after first login in any
/// deployment that matters.
pub const SEED_ADMIN_PASSWORD: &str = "password";

// ─── Persisted schema ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
  users:   Vec<User>,
  next_id: u64,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lode account store backed by a single JSON file.
///
/// Cloning is cheap: the store holds only the path. Every operation reads
/// the file, mutates in memory, then atomically replaces the file.
#[derive(Debug, Clone)]
pub struct JsonUserStore {
  path: PathBuf,
}

impl JsonUserStore {
  /// Open a store at `path`, seeding it on first use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self { path: path.as_ref().to_path_buf() };
    store.initialize().await?;
    Ok(store)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Create the store with exactly the seeded Administrator account if no
  /// file exists yet. Idempotent: an existing file is never touched.
  async fn initialize(&self) -> Result<()> {
    if tokio::fs::try_exists(&self.path).await? {
      return Ok(());
    }
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }

    let seed = StoreFile {
      users:   vec![User {
        id:            lode_core::user::SEED_ADMIN_ID,
        username:      SEED_ADMIN_USERNAME.to_string(),
        password_hash: hash_password(SEED_ADMIN_PASSWORD)?,
        role:          Role::Administrator,
        email:         default_email(SEED_ADMIN_USERNAME),
        created_at:    Utc::now(),
      }],
      next_id: 2,
    };
    tracing::info!(path = %self.path.display(), "seeding user store");
    self.write(&seed).await
  }

  async fn read(&self) -> Result<StoreFile> {
    let bytes = tokio::fs::read(&self.path).await?;
    serde_json::from_slice(&bytes).map_err(|source| Error::Corrupt {
      path: self.path.clone(),
      source,
    })
  }

  /// Whole-file replace via write-to-temp-then-rename. A partial write
  /// would corrupt all accounts, not just the newest one.
  async fn write(&self, file: &StoreFile) -> Result<()> {
    let json = serde_json::to_vec_pretty(file)?;
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    Ok(())
  }
}

// ─── Password hashing ────────────────────────────────────────────────────────

fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// `false` for a wrong password and for a stored hash that is not a valid
/// PHC string; an unverifiable account must not be loggable-into.
fn verify_password(stored_hash: &str, password: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(stored_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for JsonUserStore {
  type Error = Error;

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let mut file = self.read().await?;

    let email = if input.email.trim().is_empty() {
      default_email(&input.username)
    } else {
      input.email.trim().to_string()
    };

    let user = User {
      id:            file.next_id,
      username:      input.username,
      password_hash: hash_password(&input.password)?,
      role:          input.role,
      email,
      created_at:    Utc::now(),
    };

    file.users.push(user.clone());
    file.next_id += 1;
    self.write(&file).await?;

    Ok(user)
  }

  async fn authenticate(
    &self,
    identifier: &str,
    password: &str,
  ) -> Result<Option<User>> {
    let file = self.read().await?;
    Ok(
      file
        .users
        .into_iter()
        .find(|u| {
          (identifier == u.username || identifier == u.email)
            && verify_password(&u.password_hash, password)
        }),
    )
  }

  async fn delete_user(&self, id: u64) -> Result<()> {
    let mut file = self.read().await?;
    let before = file.users.len();
    file.users.retain(|u| u.id != id);
    if file.users.len() == before {
      // Missing id: nothing to persist.
      return Ok(());
    }
    self.write(&file).await
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    Ok(self.read().await?.users)
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
    let file = self.read().await?;
    Ok(file.users.into_iter().find(|u| u.username == username))
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    let file = self.read().await?;
    Ok(file.users.into_iter().find(|u| u.email == email))
  }
}
