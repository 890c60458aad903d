//! Session state and the controller that gates every privileged operation.
//!
//! Each interactive session is a state machine over
//! `{LoggedOut, LoggedIn(username, role)}`. The server hosts many sessions
//! at once, so the machines live in a token-indexed registry: a missing or
//! unknown token IS the logged-out state, and logout simply removes the
//! entry.

use std::{collections::HashMap, sync::Arc};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use lode_core::{
  Error as CoreError,
  role::Role,
  store::UserStore,
  user::{NewUser, SEED_ADMIN_ID, User, default_email},
};

use crate::{AppState, error::ApiError};

// ─── Session registry ────────────────────────────────────────────────────────

/// The authenticated identity behind one session token.
#[derive(Debug, Clone)]
pub struct SessionInfo {
  pub user_id:  u64,
  pub username: String,
  pub role:     Role,
}

/// Token-indexed live sessions. In-memory only: restarting the server logs
/// everyone out, which is acceptable for this tool.
#[derive(Debug, Default)]
pub struct Sessions {
  inner: RwLock<HashMap<Uuid, SessionInfo>>,
}

impl Sessions {
  pub async fn insert(&self, info: SessionInfo) -> Uuid {
    let token = Uuid::new_v4();
    self.inner.write().await.insert(token, info);
    token
  }

  pub async fn get(&self, token: Uuid) -> Option<SessionInfo> {
    self.inner.read().await.get(&token).cloned()
  }

  pub async fn remove(&self, token: Uuid) {
    self.inner.write().await.remove(&token);
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// A registration request, validated in the order the original flow fixed:
/// mismatch, missing fields, admin code, duplicates.
#[derive(Debug, Clone)]
pub struct Registration {
  pub username:   String,
  pub password:   String,
  pub confirm:    String,
  pub role:       Role,
  pub email:      String,
  pub admin_code: String,
}

/// Drives the session state machine over a [`UserStore`]. Role checks for
/// privileged operations happen here, never in the underlying stores.
pub struct SessionController<S> {
  store:        Arc<S>,
  sessions:     Arc<Sessions>,
  admin_secret: String,
}

impl<S: UserStore> SessionController<S> {
  pub fn new(
    store: Arc<S>,
    sessions: Arc<Sessions>,
    admin_secret: impl Into<String>,
  ) -> Self {
    Self { store, sessions, admin_secret: admin_secret.into() }
  }

  /// On success the session moves to `LoggedIn`; otherwise it stays out
  /// and the caller re-prompts.
  pub async fn login(
    &self,
    identifier: &str,
    password: &str,
  ) -> Result<(Uuid, SessionInfo), ApiError> {
    let user = self
      .store
      .authenticate(identifier.trim(), password)
      .await
      .map_err(ApiError::store)?;

    let Some(user) = user else {
      tracing::debug!(identifier = identifier.trim(), "login rejected");
      return Err(CoreError::InvalidCredentials.into());
    };

    let info = SessionInfo {
      user_id:  user.id,
      username: user.username,
      role:     user.role,
    };
    let token = self.sessions.insert(info.clone()).await;
    tracing::info!(username = %info.username, role = ?info.role, "login");
    Ok((token, info))
  }

  /// Registration never logs the caller in; they log in separately.
  pub async fn register(&self, reg: Registration) -> Result<User, ApiError> {
    if reg.password != reg.confirm {
      return Err(CoreError::PasswordMismatch.into());
    }
    if reg.username.trim().is_empty() || reg.password.is_empty() {
      return Err(CoreError::MissingFields.into());
    }
    if reg.role.is_administrator() && reg.admin_code != self.admin_secret {
      return Err(CoreError::InvalidAdminCode.into());
    }

    let username = reg.username.trim().to_string();
    if self
      .store
      .find_by_username(&username)
      .await
      .map_err(ApiError::store)?
      .is_some()
    {
      return Err(CoreError::DuplicateUsername.into());
    }

    // Defaulted emails take part in the uniqueness check too, so the
    // username-or-email login scan stays unambiguous.
    let email = if reg.email.trim().is_empty() {
      default_email(&username)
    } else {
      reg.email.trim().to_string()
    };
    if self
      .store
      .find_by_email(&email)
      .await
      .map_err(ApiError::store)?
      .is_some()
    {
      return Err(CoreError::DuplicateEmail.into());
    }

    let user = self
      .store
      .create_user(NewUser {
        username,
        password: reg.password,
        role: reg.role,
        email,
      })
      .await
      .map_err(ApiError::store)?;
    tracing::info!(username = %user.username, role = ?user.role, "registered");
    Ok(user)
  }

  /// Unconditional: an unknown token is already logged out.
  pub async fn logout(&self, token: Uuid) {
    self.sessions.remove(token).await;
  }

  /// Administrator-only, and never the seed account or the account the
  /// session itself is logged in as. The store below stays total.
  pub async fn delete_user(
    &self,
    session: &SessionInfo,
    id: u64,
  ) -> Result<(), ApiError> {
    require_administrator(session)?;
    if id == SEED_ADMIN_ID {
      return Err(ApiError::BadRequest(
        "the seeded administrator cannot be deleted".to_string(),
      ));
    }
    if id == session.user_id {
      return Err(ApiError::BadRequest(
        "cannot delete the account this session is logged in as".to_string(),
      ));
    }
    self.store.delete_user(id).await.map_err(ApiError::store)?;
    tracing::info!(id, deleted_by = %session.username, "user deleted");
    Ok(())
  }
}

/// The role check behind every privileged operation.
pub fn require_administrator(session: &SessionInfo) -> Result<(), ApiError> {
  if session.role.is_administrator() {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a live session token.
pub struct CurrentSession {
  pub token: Uuid,
  pub info:  SessionInfo,
}

/// Pull the bare token out of an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

impl<S> FromRequestParts<AppState<S>> for CurrentSession
where
  S: UserStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .and_then(|t| Uuid::parse_str(t).ok())
      .ok_or(ApiError::Unauthorized)?;
    let info = state
      .sessions
      .get(token)
      .await
      .ok_or(ApiError::Unauthorized)?;
    Ok(CurrentSession { token, info })
  }
}
