//! Read-model aggregations over the joined views: headline metrics, top
//! performers, country profiles, and cross-country comparison.
//!
//! All functions are pure over a snapshot's rows; missing numeric cells
//! count as zero in sums, and orderings are deterministic (tonnage
//! descending, ties broken by name).

use std::collections::BTreeMap;

use serde::Serialize;

use lode_core::record::{Country, JoinedProduction};

// ─── Headline metrics ────────────────────────────────────────────────────────

/// Dataset-wide totals shown at the top of every dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineMetrics {
  pub total_mining_revenue_billion_usd: f64,
  pub total_gdp_billion_usd:            f64,
}

pub fn headline_metrics(countries: &[Country]) -> HeadlineMetrics {
  HeadlineMetrics {
    total_mining_revenue_billion_usd: countries
      .iter()
      .map(|c| c.mining_revenue.unwrap_or(0.0))
      .sum(),
    total_gdp_billion_usd: countries
      .iter()
      .map(|c| c.gdp.unwrap_or(0.0))
      .sum(),
  }
}

// ─── Top performers ──────────────────────────────────────────────────────────

/// A grouped production total, for either a mineral or a country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionTotal {
  pub name:              String,
  pub production_tonnes: f64,
}

fn top_by<F>(view: &[JoinedProduction], key: F, limit: usize) -> Vec<ProductionTotal>
where
  F: Fn(&JoinedProduction) -> &str,
{
  let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
  for row in view {
    *totals.entry(key(row)).or_insert(0.0) +=
      row.production_tonnes.unwrap_or(0.0);
  }

  let mut ranked: Vec<ProductionTotal> = totals
    .into_iter()
    .map(|(name, production_tonnes)| ProductionTotal {
      name: name.to_string(),
      production_tonnes,
    })
    .collect();

  // BTreeMap iteration already orders ties by name; the sort below is
  // stable, so equal tonnages keep that order.
  ranked.sort_by(|a, b| {
    b.production_tonnes
      .partial_cmp(&a.production_tonnes)
      .unwrap_or(std::cmp::Ordering::Equal)
  });
  ranked.truncate(limit);
  ranked
}

/// Minerals by total production tonnage, descending.
pub fn top_minerals(
  view: &[JoinedProduction],
  limit: usize,
) -> Vec<ProductionTotal> {
  top_by(view, |row| &row.mineral_name, limit)
}

/// Countries by total production tonnage, descending.
pub fn top_countries(
  view: &[JoinedProduction],
  limit: usize,
) -> Vec<ProductionTotal> {
  top_by(view, |row| &row.country_name, limit)
}

// ─── Country profile ─────────────────────────────────────────────────────────

/// One country's headline row, its production breakdown, and the share of
/// GDP its mining revenue represents.
#[derive(Debug, Clone, Serialize)]
pub struct CountryProfile {
  pub country:                  Country,
  /// Percent; `None` when GDP is absent or zero rather than a division
  /// by a defaulted denominator.
  pub mining_share_of_gdp_pct:  Option<f64>,
  pub production:               Vec<JoinedProduction>,
}

pub fn country_profile(
  countries: &[Country],
  view: &[JoinedProduction],
  name: &str,
) -> Option<CountryProfile> {
  let country = countries.iter().find(|c| c.name == name)?.clone();

  let mining_share_of_gdp_pct = match (country.mining_revenue, country.gdp) {
    (Some(revenue), Some(gdp)) if gdp > 0.0 => Some(revenue / gdp * 100.0),
    _ => None,
  };

  let production = view
    .iter()
    .filter(|row| row.country_name == name)
    .cloned()
    .collect();

  Some(CountryProfile { country, mining_share_of_gdp_pct, production })
}

// ─── Comparison ──────────────────────────────────────────────────────────────

/// The joined production rows for the named countries, preserving view
/// order. Unknown names simply match nothing.
pub fn compare<'a>(
  view: &'a [JoinedProduction],
  names: &[String],
) -> Vec<&'a JoinedProduction> {
  view
    .iter()
    .filter(|row| names.iter().any(|n| *n == row.country_name))
    .collect()
}
