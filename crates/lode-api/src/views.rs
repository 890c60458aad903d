//! Read-only data endpoints. Available to any authenticated role; which
//! dashboard shows what is the front end's concern, fully described by
//! `/api/pages`.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use lode_core::{
  record::{JoinedProduction, JoinedSite},
  store::UserStore,
};
use lode_data::{
  map::{self, MapModel},
  summary::{
    CountryProfile, HeadlineMetrics, ProductionTotal, country_profile,
    headline_metrics, top_countries, top_minerals,
  },
};

use crate::{AppState, error::ApiError, session::CurrentSession};

/// A joined view, or the "insufficient data" shape when the join could not
/// run. Never an error: the dashboard renders an empty state instead.
#[derive(Debug, Serialize)]
pub struct ViewResponse<T> {
  pub available: bool,
  pub rows:      Vec<T>,
}

impl<T> ViewResponse<T> {
  fn from_view(view: Option<&[T]>) -> Self
  where
    T: Clone,
  {
    match view {
      Some(rows) => Self { available: true, rows: rows.to_vec() },
      None => Self { available: false, rows: Vec::new() },
    }
  }
}

// ─── Joined views ────────────────────────────────────────────────────────────

/// `GET /api/production`
pub async fn production<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
) -> Json<ViewResponse<JoinedProduction>>
where
  S: UserStore + 'static,
{
  let snapshot = state.repo.load().await;
  Json(ViewResponse::from_view(snapshot.production_view.as_deref()))
}

/// `GET /api/sites`
pub async fn sites<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
) -> Json<ViewResponse<JoinedSite>>
where
  S: UserStore + 'static,
{
  let snapshot = state.repo.load().await;
  Json(ViewResponse::from_view(snapshot.site_view.as_deref()))
}

// ─── Map ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MapParams {
  #[serde(default = "all_minerals")]
  pub mineral: String,
}

fn all_minerals() -> String {
  map::ALL_MINERALS.to_string()
}

#[derive(Debug, Serialize)]
pub struct MapResponse {
  pub available: bool,
  pub model:     Option<MapModel>,
}

/// `GET /api/map?mineral=<name|All>`
pub async fn map_model<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Query(params): Query<MapParams>,
) -> Json<MapResponse>
where
  S: UserStore + 'static,
{
  let snapshot = state.repo.load().await;
  let sites = snapshot.site_view.as_deref().unwrap_or(&[]);
  let model = map::build(sites, &params.mineral);
  Json(MapResponse { available: model.is_some(), model })
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
  #[serde(default = "default_limit")]
  pub limit: usize,
}

fn default_limit() -> usize {
  8
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub metrics:       HeadlineMetrics,
  pub top_minerals:  Vec<ProductionTotal>,
  pub top_countries: Vec<ProductionTotal>,
}

/// `GET /api/summary[?limit=N]`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Query(params): Query<SummaryParams>,
) -> Json<SummaryResponse>
where
  S: UserStore + 'static,
{
  let snapshot = state.repo.load().await;
  let view = snapshot.production_view.as_deref().unwrap_or(&[]);
  Json(SummaryResponse {
    metrics:       headline_metrics(&snapshot.countries.rows),
    top_minerals:  top_minerals(view, params.limit),
    top_countries: top_countries(view, params.limit),
  })
}

// ─── Country profile / comparison ────────────────────────────────────────────

/// `GET /api/countries/{name}`
pub async fn country<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(name): Path<String>,
) -> Result<Json<CountryProfile>, ApiError>
where
  S: UserStore + 'static,
{
  let snapshot = state.repo.load().await;
  let view = snapshot.production_view.as_deref().unwrap_or(&[]);
  country_profile(&snapshot.countries.rows, view, &name)
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("country {name:?} not found")))
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
  /// Comma-separated country names.
  #[serde(default)]
  pub countries: String,
}

/// `GET /api/compare?countries=a,b`
pub async fn compare<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Query(params): Query<CompareParams>,
) -> Json<ViewResponse<JoinedProduction>>
where
  S: UserStore + 'static,
{
  let names: Vec<String> = params
    .countries
    .split(',')
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(String::from)
    .collect();

  let snapshot = state.repo.load().await;
  let rows = snapshot
    .production_view
    .as_deref()
    .map(|view| {
      lode_data::summary::compare(view, &names)
        .into_iter()
        .cloned()
        .collect()
    });
  Json(match rows {
    Some(rows) => ViewResponse { available: true, rows },
    None => ViewResponse { available: false, rows: Vec::new() },
  })
}
