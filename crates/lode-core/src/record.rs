//! Source-table records and the derived joined views.
//!
//! Field names are renamed to the exact column headers of the four CSV
//! sources, so the serialised shape of a record (and of a joined row) is
//! identical to the tabular shape consumers already know.
//!
//! Key columns (`*ID`, names) are strict: a malformed key fails the file.
//! Measure columns (revenue, tonnage, coordinates) are lenient: a cell that
//! does not parse as a number loads as `None` and the row survives.

use serde::{Deserialize, Deserializer, Serialize};

// ─── Lenient numerics ────────────────────────────────────────────────────────

/// Deserialise a numeric measure cell, mapping anything unparseable
/// (including an empty cell) to `None` instead of failing the record.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  Ok(raw.and_then(|s| s.trim().parse().ok()))
}

// ─── Source records ──────────────────────────────────────────────────────────

/// One row of `countries.csv`. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
  #[serde(rename = "CountryID")]
  pub country_id:     i64,
  #[serde(rename = "CountryName")]
  pub name:           String,
  #[serde(rename = "GDP_BillionUSD", default, deserialize_with = "lenient_f64")]
  pub gdp:            Option<f64>,
  #[serde(rename = "MiningRevenue_BillionUSD", default, deserialize_with = "lenient_f64")]
  pub mining_revenue: Option<f64>,
  #[serde(rename = "KeyProjects", default)]
  pub key_projects:   String,
}

/// One row of `minerals.csv`. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mineral {
  #[serde(rename = "MineralID")]
  pub mineral_id:  i64,
  #[serde(rename = "MineralName")]
  pub name:        String,
  #[serde(rename = "Description", default)]
  pub description: String,
}

/// One row of `production_stats.csv`; many-to-one against [`Country`] and
/// [`Mineral`] via their ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
  #[serde(rename = "CountryID")]
  pub country_id:        i64,
  #[serde(rename = "MineralID")]
  pub mineral_id:        i64,
  #[serde(rename = "Production_tonnes", default, deserialize_with = "lenient_f64")]
  pub production_tonnes: Option<f64>,
  #[serde(rename = "ExportValue_BillionUSD", default, deserialize_with = "lenient_f64")]
  pub export_value:      Option<f64>,
}

/// One row of `sites.csv`. Coordinates are lenient on purpose: a site with
/// an unparseable latitude still appears in tabular views, and is excluded
/// only from the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
  #[serde(rename = "SiteID")]
  pub site_id:           i64,
  #[serde(rename = "SiteName")]
  pub name:              String,
  #[serde(rename = "CountryID")]
  pub country_id:        i64,
  #[serde(rename = "MineralID")]
  pub mineral_id:        i64,
  #[serde(rename = "Latitude", default, deserialize_with = "lenient_f64")]
  pub latitude:          Option<f64>,
  #[serde(rename = "Longitude", default, deserialize_with = "lenient_f64")]
  pub longitude:         Option<f64>,
  #[serde(rename = "Production_tonnes", default, deserialize_with = "lenient_f64")]
  pub production_tonnes: Option<f64>,
}

// ─── Joined views ────────────────────────────────────────────────────────────

/// A production record inner-joined with its country and mineral.
///
/// Never persisted. Rows with an unmatched foreign key are dropped at join
/// time, so `country_name` and `mineral_name` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedProduction {
  #[serde(rename = "CountryID")]
  pub country_id:          i64,
  #[serde(rename = "MineralID")]
  pub mineral_id:          i64,
  #[serde(rename = "Production_tonnes")]
  pub production_tonnes:   Option<f64>,
  #[serde(rename = "ExportValue_BillionUSD")]
  pub export_value:        Option<f64>,
  #[serde(rename = "CountryName")]
  pub country_name:        String,
  #[serde(rename = "GDP_BillionUSD")]
  pub gdp:                 Option<f64>,
  #[serde(rename = "MiningRevenue_BillionUSD")]
  pub mining_revenue:      Option<f64>,
  #[serde(rename = "KeyProjects")]
  pub key_projects:        String,
  #[serde(rename = "MineralName")]
  pub mineral_name:        String,
  #[serde(rename = "Description")]
  pub mineral_description: String,
}

/// A site inner-joined with its country and mineral. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedSite {
  #[serde(rename = "SiteID")]
  pub site_id:             i64,
  #[serde(rename = "SiteName")]
  pub site_name:           String,
  #[serde(rename = "CountryID")]
  pub country_id:          i64,
  #[serde(rename = "MineralID")]
  pub mineral_id:          i64,
  #[serde(rename = "Latitude")]
  pub latitude:            Option<f64>,
  #[serde(rename = "Longitude")]
  pub longitude:           Option<f64>,
  #[serde(rename = "Production_tonnes")]
  pub production_tonnes:   Option<f64>,
  #[serde(rename = "CountryName")]
  pub country_name:        String,
  #[serde(rename = "MiningRevenue_BillionUSD")]
  pub mining_revenue:      Option<f64>,
  #[serde(rename = "MineralName")]
  pub mineral_name:        String,
}

impl JoinedProduction {
  pub fn from_parts(
    record: &ProductionRecord,
    country: &Country,
    mineral: &Mineral,
  ) -> Self {
    Self {
      country_id:          record.country_id,
      mineral_id:          record.mineral_id,
      production_tonnes:   record.production_tonnes,
      export_value:        record.export_value,
      country_name:        country.name.clone(),
      gdp:                 country.gdp,
      mining_revenue:      country.mining_revenue,
      key_projects:        country.key_projects.clone(),
      mineral_name:        mineral.name.clone(),
      mineral_description: mineral.description.clone(),
    }
  }
}

impl JoinedSite {
  pub fn from_parts(site: &Site, country: &Country, mineral: &Mineral) -> Self {
    Self {
      site_id:           site.site_id,
      site_name:         site.name.clone(),
      country_id:        site.country_id,
      mineral_id:        site.mineral_id,
      latitude:          site.latitude,
      longitude:         site.longitude,
      production_tonnes: site.production_tonnes,
      country_name:      country.name.clone(),
      mining_revenue:    country.mining_revenue,
      mineral_name:      mineral.name.clone(),
    }
  }
}
