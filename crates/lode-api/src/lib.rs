//! HTTP JSON surface for the Lode minerals data service.
//!
//! Exposes an axum [`Router`] backed by any [`UserStore`] plus the
//! [`DataRepository`]. The front end that renders charts and maps is an
//! external collaborator: it consumes the joined views, map model, and
//! summary aggregates as JSON and never reaches the stores directly.

pub mod admin;
pub mod auth;
pub mod error;
pub mod session;
pub mod views;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use serde::Deserialize;

use lode_core::store::UserStore;
use lode_data::DataRepository;
use session::{SessionController, Sessions};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `LODE_*` environment variables. Every field has a default so the
/// server runs from a bare checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  /// Directory holding the four CSV sources.
  #[serde(default = "default_data_dir")]
  pub data_dir:     PathBuf,
  #[serde(default = "default_users_file")]
  pub users_file:   PathBuf,
  /// Administrator registration secret (`LODE_ADMIN_SECRET`). The default
  /// is a known value; override it in any real deployment.
  #[serde(default = "default_admin_secret")]
  pub admin_secret: String,
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  8700
}

fn default_data_dir() -> PathBuf {
  PathBuf::from("data")
}

fn default_users_file() -> PathBuf {
  PathBuf::from("data/users.json")
}

fn default_admin_secret() -> String {
  "letmein".to_string()
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         default_host(),
      port:         default_port(),
      data_dir:     default_data_dir(),
      users_file:   default_users_file(),
      admin_secret: default_admin_secret(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub repo:     Arc<DataRepository>,
  pub sessions: Arc<Sessions>,
  pub config:   Arc<ServerConfig>,
}

// Manual impl: `Arc` fields clone regardless of whether `S` does.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      repo:     Arc::clone(&self.repo),
      sessions: Arc::clone(&self.sessions),
      config:   Arc::clone(&self.config),
    }
  }
}

impl<S: UserStore + 'static> AppState<S> {
  /// The session controller for this state: the one place role gating
  /// and registration validation happen.
  pub fn controller(&self) -> SessionController<S> {
    SessionController::new(
      Arc::clone(&self.store),
      Arc::clone(&self.sessions),
      self.config.admin_secret.clone(),
    )
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: UserStore + 'static,
{
  Router::new()
    // Accounts
    .route(
      "/api/session",
      post(auth::login::<S>).delete(auth::logout::<S>),
    )
    .route("/api/register", post(auth::register::<S>))
    .route("/api/pages", get(auth::pages::<S>))
    // Joined views and read models
    .route("/api/production", get(views::production::<S>))
    .route("/api/sites", get(views::sites::<S>))
    .route("/api/map", get(views::map_model::<S>))
    .route("/api/summary", get(views::summary::<S>))
    .route("/api/countries/{name}", get(views::country::<S>))
    .route("/api/compare", get(views::compare::<S>))
    // Administrator operations
    .route("/api/sources/{name}", put(admin::replace_source::<S>))
    .route("/api/users", get(admin::list_users::<S>))
    .route("/api/users/{id}", delete(admin::delete_user::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  use lode_store_json::JsonUserStore;

  const COUNTRIES: &str = "\
CountryID,CountryName,GDP_BillionUSD,MiningRevenue_BillionUSD,KeyProjects
1,Zed,10,2,P1
2,Wye,55.5,8.1,Copperbelt expansion
";

  const MINERALS: &str = "\
MineralID,MineralName,Description
1,Cobalt,d
2,Lithium,battery metal
";

  const PRODUCTION: &str = "\
CountryID,MineralID,Production_tonnes,ExportValue_BillionUSD
1,1,100,5
2,2,40000,1.2
";

  const SITES: &str = "\
SiteID,SiteName,CountryID,MineralID,Latitude,Longitude,Production_tonnes
1,Kolwezi,1,1,-10.7,25.5,100
2,Goulamina,2,2,-11.9,-7.9,40000
";

  async fn make_state(dir: &TempDir) -> AppState<JsonUserStore> {
    let store = JsonUserStore::open(dir.path().join("users.json"))
      .await
      .expect("open store");
    AppState {
      store:    Arc::new(store),
      repo:     Arc::new(DataRepository::new(dir.path().join("data"))),
      sessions: Arc::new(Sessions::default()),
      config:   Arc::new(ServerConfig::default()),
    }
  }

  fn write_sources(dir: &TempDir) {
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("countries.csv"), COUNTRIES).unwrap();
    std::fs::write(data.join("minerals.csv"), MINERALS).unwrap();
    std::fs::write(data.join("production_stats.csv"), PRODUCTION).unwrap();
    std::fs::write(data.join("sites.csv"), SITES).unwrap();
  }

  /// Drive one request through a fresh router over the shared state.
  async fn send(
    state: &AppState<JsonUserStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// Raw-body variant for CSV uploads.
  async fn send_csv(
    state: &AppState<JsonUserStore>,
    uri: &str,
    token: &str,
    csv: &str,
  ) -> (StatusCode, Value) {
    let request = Request::builder()
      .method("PUT")
      .uri(uri)
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .header(header::CONTENT_TYPE, "text/csv")
      .body(Body::from(csv.to_string()))
      .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn login(
    state: &AppState<JsonUserStore>,
    identifier: &str,
    password: &str,
  ) -> String {
    let (status, body) = send(
      state,
      "POST",
      "/api/session",
      None,
      Some(json!({ "identifier": identifier, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
  }

  async fn register_researcher(
    state: &AppState<JsonUserStore>,
    username: &str,
  ) {
    let (status, _) = send(
      state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": username,
        "password": "pw",
        "confirm": "pw",
        "role": "Researcher",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  // ── Login / logout ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn seed_administrator_logs_in_and_reaches_admin_pages() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/session",
      None,
      Some(json!({ "identifier": "admin", "password": "password" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "Administrator");
    assert_eq!(body["pages"], json!(["Admin", "Home"]));
    assert!(body["token"].as_str().is_some());
  }

  #[tokio::test]
  async fn wrong_password_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/session",
      None,
      Some(json!({ "identifier": "admin", "password": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
  }

  #[tokio::test]
  async fn logout_invalidates_the_token() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    let token = login(&state, "admin", "password").await;

    let (status, _) =
      send(&state, "DELETE", "/api/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
      send(&state, "GET", "/api/pages", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn data_endpoints_require_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    for uri in ["/api/pages", "/api/production", "/api/sites", "/api/map"] {
      let (status, _) = send(&state, "GET", uri, None, None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "no 401 for {uri}");
    }
  }

  // ── Registration ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_then_login_as_researcher() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "amina",
        "password": "pw",
        "confirm": "pw",
        "role": "Researcher",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "amina@minerals.local");
    assert!(body.get("password_hash").is_none());

    // Registration does not log in; a separate login is required.
    let (status, body) = send(
      &state,
      "POST",
      "/api/session",
      None,
      Some(json!({ "identifier": "amina", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages"], json!(["Researcher", "Home"]));
  }

  #[tokio::test]
  async fn register_validations_fire_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    // Password mismatch wins even with a blank username.
    let (status, body) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "", "password": "a", "confirm": "b", "role": "Investor",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "passwords do not match");

    let (status, body) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "", "password": "a", "confirm": "a", "role": "Investor",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "provide username and password");
  }

  #[tokio::test]
  async fn administrator_registration_needs_the_secret() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    // Wrong code fails regardless of other field validity.
    let (status, body) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "boss", "password": "pw", "confirm": "pw",
        "role": "Administrator", "admin_code": "wrong",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "invalid administrator code");

    let (status, _) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "boss", "password": "pw", "confirm": "pw",
        "role": "Administrator", "admin_code": "letmein",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  #[tokio::test]
  async fn duplicate_username_and_email_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    register_researcher(&state, "amina").await;

    let (status, body) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "amina", "password": "pw", "confirm": "pw",
        "role": "Investor",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "username already exists");

    // A custom email colliding with amina's defaulted one is refused.
    let (status, body) = send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "someone", "password": "pw", "confirm": "pw",
        "role": "Investor", "email": "amina@minerals.local",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email already in use");
  }

  #[tokio::test]
  async fn investor_reaches_only_the_investor_page() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "vc", "password": "pw", "confirm": "pw",
        "role": "Investor",
      })),
    )
    .await;
    let token = login(&state, "vc", "pw").await;

    let (status, body) =
      send(&state, "GET", "/api/pages", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages"], json!(["Investor"]));
    assert_eq!(body["home"], "Investor");
  }

  // ── Data endpoints ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn views_degrade_to_unavailable_without_sources() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    let token = login(&state, "admin", "password").await;

    let (status, body) =
      send(&state, "GET", "/api/production", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["rows"], json!([]));

    let (_, body) = send(&state, "GET", "/api/map", Some(&token), None).await;
    assert_eq!(body["available"], false);
  }

  #[tokio::test]
  async fn joined_views_are_served_with_sources_in_place() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(&dir);
    let state = make_state(&dir).await;
    let token = login(&state, "admin", "password").await;

    let (status, body) =
      send(&state, "GET", "/api/production", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["CountryName"], "Zed");
    assert_eq!(rows[0]["MineralName"], "Cobalt");
    assert_eq!(rows[0]["Production_tonnes"], 100.0);

    let (_, body) =
      send(&state, "GET", "/api/map?mineral=Cobalt", Some(&token), None).await;
    assert_eq!(body["available"], true);
    let markers = body["model"]["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["label"], "Kolwezi: Cobalt, Zed, 100 t");
  }

  #[tokio::test]
  async fn summary_profile_and_compare() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(&dir);
    let state = make_state(&dir).await;
    let token = login(&state, "admin", "password").await;

    let (_, body) =
      send(&state, "GET", "/api/summary", Some(&token), None).await;
    assert_eq!(body["metrics"]["total_gdp_billion_usd"], 65.5);
    assert_eq!(body["top_minerals"][0]["name"], "Lithium");

    let (status, body) =
      send(&state, "GET", "/api/countries/Zed", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mining_share_of_gdp_pct"], 20.0);

    let (status, _) =
      send(&state, "GET", "/api/countries/Atlantis", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(
      &state,
      "GET",
      "/api/compare?countries=Zed,Wye",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
  }

  // ── Administrator operations ───────────────────────────────────────────────

  #[tokio::test]
  async fn source_upload_is_admin_only_and_name_checked() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(&dir);
    let state = make_state(&dir).await;

    register_researcher(&state, "amina").await;
    let researcher = login(&state, "amina", "pw").await;
    let (status, _) =
      send_csv(&state, "/api/sources/countries.csv", &researcher, COUNTRIES)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&state, "admin", "password").await;
    let (status, body) =
      send_csv(&state, "/api/sources/evil.csv", &admin, COUNTRIES).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("evil.csv"));

    // The rejected upload left the cached tables unchanged.
    let (_, body) =
      send(&state, "GET", "/api/production", Some(&admin), None).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn source_upload_replaces_invalidates_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(&dir);
    let state = make_state(&dir).await;
    let admin = login(&state, "admin", "password").await;

    // Warm the cache first so the import must actually invalidate it.
    send(&state, "GET", "/api/production", Some(&admin), None).await;

    let replacement = "\
CountryID,CountryName,GDP_BillionUSD,MiningRevenue_BillionUSD,KeyProjects
1,Zed,12,3,P1
";
    let (status, body) =
      send_csv(&state, "/api/sources/countries.csv", &admin, replacement)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "countries");
    assert_eq!(body["countries"], 1);

    // Wye is gone, so its production row dropped out of the join.
    let (_, body) =
      send(&state, "GET", "/api/production", Some(&admin), None).await;
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["CountryName"], "Zed");
  }

  #[tokio::test]
  async fn user_management_is_admin_only() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    register_researcher(&state, "amina").await;

    let researcher = login(&state, "amina", "pw").await;
    let (status, _) =
      send(&state, "GET", "/api/users", Some(&researcher), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&state, "admin", "password").await;
    let (status, body) =
      send(&state, "GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
  }

  #[tokio::test]
  async fn delete_user_removes_the_account() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    register_researcher(&state, "amina").await;
    let admin = login(&state, "admin", "password").await;

    let (_, body) = send(&state, "GET", "/api/users", Some(&admin), None).await;
    let id = body
      .as_array()
      .unwrap()
      .iter()
      .find(|u| u["username"] == "amina")
      .unwrap()["id"]
      .as_u64()
      .unwrap();

    let (status, _) = send(
      &state,
      "DELETE",
      &format!("/api/users/{id}"),
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted account can no longer log in.
    let (status, _) = send(
      &state,
      "POST",
      "/api/session",
      None,
      Some(json!({ "identifier": "amina", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Deleting a missing id is still a 204 no-op.
    let (status, _) = send(
      &state,
      "DELETE",
      &format!("/api/users/{id}"),
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  #[tokio::test]
  async fn seed_and_own_accounts_cannot_be_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    let admin = login(&state, "admin", "password").await;

    // The seed administrator is refused (it is also the session's own
    // account; the seed rule is checked first).
    let (status, body) =
      send(&state, "DELETE", "/api/users/1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("administrator"));

    // A second administrator cannot delete itself either.
    send(
      &state,
      "POST",
      "/api/register",
      None,
      Some(json!({
        "username": "boss", "password": "pw", "confirm": "pw",
        "role": "Administrator", "admin_code": "letmein",
      })),
    )
    .await;
    let boss = login(&state, "boss", "pw").await;
    let (_, body) = send(&state, "GET", "/api/users", Some(&boss), None).await;
    let boss_id = body
      .as_array()
      .unwrap()
      .iter()
      .find(|u| u["username"] == "boss")
      .unwrap()["id"]
      .as_u64()
      .unwrap();

    let (status, _) = send(
      &state,
      "DELETE",
      &format!("/api/users/{boss_id}"),
      Some(&boss),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&state, "GET", "/api/users", Some(&boss), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
  }
}
