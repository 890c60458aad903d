//! Handlers for the account endpoints.
//!
//! | Method   | Path            | Notes                                   |
//! |----------|-----------------|-----------------------------------------|
//! | `POST`   | `/api/session`  | Login; body `{identifier, password}`    |
//! | `DELETE` | `/api/session`  | Logout; always 204                      |
//! | `POST`   | `/api/register` | Stays logged out; log in separately     |
//! | `GET`    | `/api/pages`    | Reachable pages for the session's role  |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lode_core::{
  role::{Page, Role},
  store::UserStore,
  user::UserSummary,
};

use crate::{
  AppState,
  error::ApiError,
  session::{CurrentSession, Registration, bearer_token},
};

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// Username or email, matched exactly.
  pub identifier: String,
  pub password:   String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:    Uuid,
  pub username: String,
  pub role:     Role,
  pub pages:    Vec<Page>,
}

/// `POST /api/session`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: UserStore + 'static,
{
  let (token, info) = state
    .controller()
    .login(&body.identifier, &body.password)
    .await?;
  Ok(Json(LoginResponse {
    token,
    pages: info.role.pages().to_vec(),
    username: info.username,
    role: info.role,
  }))
}

/// `DELETE /api/session`. Unconditional: an absent or unknown token is
/// already logged out.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> StatusCode
where
  S: UserStore + 'static,
{
  if let Some(token) =
    bearer_token(&headers).and_then(|t| Uuid::parse_str(t).ok())
  {
    state.controller().logout(token).await;
  }
  StatusCode::NO_CONTENT
}

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
  pub confirm:  String,
  pub role:     Role,
  #[serde(default)]
  pub email:    String,
  /// Required (and checked) only when `role` is `Administrator`.
  #[serde(default)]
  pub admin_code: String,
}

/// `POST /api/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: UserStore + 'static,
{
  let user = state
    .controller()
    .register(Registration {
      username:   body.username,
      password:   body.password,
      confirm:    body.confirm,
      role:       body.role,
      email:      body.email,
      admin_code: body.admin_code,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(UserSummary::from(user))))
}

// ─── Pages ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PagesResponse {
  pub role:  Role,
  pub pages: Vec<Page>,
  /// What `Home` renders as for this role.
  pub home:  Page,
}

/// `GET /api/pages`
pub async fn pages<S>(
  State(_state): State<AppState<S>>,
  session: CurrentSession,
) -> Json<PagesResponse>
where
  S: UserStore + 'static,
{
  let role = session.info.role;
  Json(PagesResponse {
    role,
    pages: role.pages().to_vec(),
    home: Page::Home.resolve(role),
  })
}
