//! Administrator-only handlers: source imports and user management.
//!
//! The role checks live in the session layer (`require_administrator` and
//! the controller's `delete_user`); the data and user stores underneath
//! stay total.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use bytes::Bytes;
use serde::Serialize;

use lode_core::{store::UserStore, user::UserSummary};
use lode_data::SourceName;

use crate::{
  AppState,
  error::ApiError,
  session::{CurrentSession, require_administrator},
};

// ─── Source import ───────────────────────────────────────────────────────────

/// Row counts after a replacement, from the freshly reloaded snapshot.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
  pub source:     SourceName,
  pub countries:  usize,
  pub minerals:   usize,
  pub production: usize,
  pub sites:      usize,
}

/// `PUT /api/sources/{filename}`. The body is the raw CSV.
///
/// The name must be one of the four canonical filenames. The handler
/// replaces the file, then invalidates and reloads, which is what keeps
/// the stale-cache window closed in practice.
pub async fn replace_source<S>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
  Path(name): Path<String>,
  body: Bytes,
) -> Result<Json<ImportResponse>, ApiError>
where
  S: UserStore + 'static,
{
  require_administrator(&session.info)?;

  let source =
    state
      .repo
      .replace_source(&name, &body)
      .await
      .map_err(|e| match e {
        lode_data::Error::InvalidSourceName(_) => {
          ApiError::BadRequest(e.to_string())
        }
        lode_data::Error::Io(_) => ApiError::store(e),
      })?;

  state.repo.invalidate().await;
  let snapshot = state.repo.load().await;

  Ok(Json(ImportResponse {
    source,
    countries: snapshot.countries.len(),
    minerals: snapshot.minerals.len(),
    production: snapshot.production.len(),
    sites: snapshot.sites.len(),
  }))
}

// ─── User management ─────────────────────────────────────────────────────────

/// `GET /api/users`. Password hashes are never serialised.
pub async fn list_users<S>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: UserStore + 'static,
{
  require_administrator(&session.info)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// `DELETE /api/users/{id}`. 204 whether or not the id existed; the seed
/// account and the session's own account are refused.
pub async fn delete_user<S>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
  Path(id): Path<u64>,
) -> Result<StatusCode, ApiError>
where
  S: UserStore + 'static,
{
  state.controller().delete_user(&session.info, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
