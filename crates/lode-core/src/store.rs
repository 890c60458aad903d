//! The `UserStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `lode-store-json`).
//! Higher layers (`lode-api`) depend on this abstraction, not on any
//! concrete backend.
//!
//! Uniqueness of usernames and emails is deliberately NOT enforced here;
//! the registration flow checks both before calling [`UserStore::create_user`].
//! Likewise the seed-administrator and own-account deletion rules live in
//! the session controller; every operation below is total on valid input.

use std::future::Future;

use crate::user::{NewUser, User};

/// Abstraction over a Lode account store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Hash the password, assign the next id, then append and persist.
  /// The `created_at` timestamp is set by the store.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Scan all users for one whose username or email equals `identifier`
  /// (case-sensitive, exact) and whose password verifies against the
  /// stored hash. First match wins; `None` if nothing matches.
  fn authenticate<'a>(
    &'a self,
    identifier: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Remove the user with the given id. A missing id is a no-op.
  fn delete_user(
    &self,
    id: u64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All users, in stored order.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Exact-match lookup by username. `None` if not found.
  fn find_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Exact-match lookup by email. First match wins; `None` if not found.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}
