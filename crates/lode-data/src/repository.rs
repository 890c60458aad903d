//! [`DataRepository`]: loads and joins the four source tables and owns
//! the cached snapshot.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Arc,
};

use tokio::sync::RwLock;

use lode_core::record::{
  Country, JoinedProduction, JoinedSite, Mineral, ProductionRecord, Site,
};

use crate::{
  Result,
  source::{SourceName, Table, read_table},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The immutable result of one load: the four tables with their load
/// provenance, plus the joined views.
///
/// A view is `None` when there is insufficient data to join (one of the
/// participating tables is empty); callers treat that as "no data", never
/// as an error. A refresh replaces the whole snapshot; nothing is patched
/// in place.
#[derive(Debug)]
pub struct Snapshot {
  pub countries:  Table<Country>,
  pub minerals:   Table<Mineral>,
  pub production: Table<ProductionRecord>,
  pub sites:      Table<Site>,

  pub production_view: Option<Vec<JoinedProduction>>,
  pub site_view:       Option<Vec<JoinedSite>>,
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// Owns the source directory and the cached snapshot.
///
/// Cache lifetime is part of this object's interface: [`Self::load`] serves
/// the cached `Arc` until [`Self::invalidate`] clears it. Readers holding an
/// old `Arc` keep a consistent snapshot; they never see a mix of old and new
/// tables.
#[derive(Debug)]
pub struct DataRepository {
  data_dir: PathBuf,
  cache:    RwLock<Option<Arc<Snapshot>>>,
}

impl DataRepository {
  pub fn new(data_dir: impl AsRef<Path>) -> Self {
    Self {
      data_dir: data_dir.as_ref().to_path_buf(),
      cache:    RwLock::new(None),
    }
  }

  pub fn data_dir(&self) -> &Path {
    &self.data_dir
  }

  /// Return the cached snapshot, reading and joining the sources first if
  /// no snapshot is cached. Total: a failed source becomes an empty table.
  pub async fn load(&self) -> Arc<Snapshot> {
    if let Some(snapshot) = self.cache.read().await.as_ref() {
      return Arc::clone(snapshot);
    }

    let snapshot = Arc::new(self.read_all().await);
    tracing::debug!(
      countries = snapshot.countries.len(),
      minerals = snapshot.minerals.len(),
      production = snapshot.production.len(),
      sites = snapshot.sites.len(),
      "loaded source tables"
    );

    // Two loaders may race here; both produce a snapshot of the same files
    // and the last write wins, so readers see one or the other whole.
    *self.cache.write().await = Some(Arc::clone(&snapshot));
    snapshot
  }

  /// Drop the cached snapshot. Call after any source file is replaced.
  pub async fn invalidate(&self) {
    *self.cache.write().await = None;
  }

  /// Write `bytes` verbatim as the named source file. The name must be one
  /// of the four canonical filenames; anything else is rejected before any
  /// side effect. The caller must invalidate and reload afterwards.
  pub async fn replace_source(
    &self,
    name: &str,
    bytes: &[u8],
  ) -> Result<SourceName> {
    let source: SourceName = name.parse()?;
    tokio::fs::create_dir_all(&self.data_dir).await?;
    tokio::fs::write(self.data_dir.join(source.file_name()), bytes).await?;
    tracing::info!(source = source.file_name(), bytes = bytes.len(), "source replaced");
    Ok(source)
  }

  async fn read_all(&self) -> Snapshot {
    let countries: Table<Country> =
      read_table(&self.data_dir, SourceName::Countries).await;
    let minerals: Table<Mineral> =
      read_table(&self.data_dir, SourceName::Minerals).await;
    let production: Table<ProductionRecord> =
      read_table(&self.data_dir, SourceName::Production).await;
    let sites: Table<Site> = read_table(&self.data_dir, SourceName::Sites).await;

    let production_view = (!production.is_empty()
      && !countries.is_empty()
      && !minerals.is_empty())
    .then(|| {
      join_production(&production.rows, &countries.rows, &minerals.rows)
    });

    let site_view = (!sites.is_empty()
      && !countries.is_empty()
      && !minerals.is_empty())
    .then(|| join_sites(&sites.rows, &countries.rows, &minerals.rows));

    Snapshot {
      countries,
      minerals,
      production,
      sites,
      production_view,
      site_view,
    }
  }
}

// ─── Joins ───────────────────────────────────────────────────────────────────

fn index_countries(countries: &[Country]) -> HashMap<i64, &Country> {
  countries.iter().map(|c| (c.country_id, c)).collect()
}

fn index_minerals(minerals: &[Mineral]) -> HashMap<i64, &Mineral> {
  minerals.iter().map(|m| (m.mineral_id, m)).collect()
}

/// Inner join on country id then mineral id. Rows with an unmatched foreign
/// key are dropped, a deliberate data-quality policy.
fn join_production(
  production: &[ProductionRecord],
  countries: &[Country],
  minerals: &[Mineral],
) -> Vec<JoinedProduction> {
  let by_country = index_countries(countries);
  let by_mineral = index_minerals(minerals);

  production
    .iter()
    .filter_map(|record| {
      let country = by_country.get(&record.country_id)?;
      let mineral = by_mineral.get(&record.mineral_id)?;
      Some(JoinedProduction::from_parts(record, country, mineral))
    })
    .collect()
}

/// Identical join rule for sites.
fn join_sites(
  sites: &[Site],
  countries: &[Country],
  minerals: &[Mineral],
) -> Vec<JoinedSite> {
  let by_country = index_countries(countries);
  let by_mineral = index_minerals(minerals);

  sites
    .iter()
    .filter_map(|site| {
      let country = by_country.get(&site.country_id)?;
      let mineral = by_mineral.get(&site.mineral_id)?;
      Some(JoinedSite::from_parts(site, country, mineral))
    })
    .collect()
}
