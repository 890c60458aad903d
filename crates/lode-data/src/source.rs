//! The four source tables: canonical names, load provenance, and the
//! lenient CSV reader.

use std::{io::ErrorKind, path::Path, str::FromStr};

use serde::{Serialize, de::DeserializeOwned};

use crate::Error;

// ─── Source names ────────────────────────────────────────────────────────────

/// One of the four independently-maintained tabular inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
  Countries,
  Minerals,
  Production,
  Sites,
}

impl SourceName {
  pub const ALL: [SourceName; 4] = [
    SourceName::Countries,
    SourceName::Minerals,
    SourceName::Production,
    SourceName::Sites,
  ];

  /// The canonical on-disk filename. Uploads must use exactly this name.
  pub fn file_name(self) -> &'static str {
    match self {
      SourceName::Countries => "countries.csv",
      SourceName::Minerals => "minerals.csv",
      SourceName::Production => "production_stats.csv",
      SourceName::Sites => "sites.csv",
    }
  }
}

impl FromStr for SourceName {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    Self::ALL
      .into_iter()
      .find(|source| source.file_name() == s)
      .ok_or_else(|| Error::InvalidSourceName(s.to_string()))
  }
}

// ─── Load provenance ─────────────────────────────────────────────────────────

/// Why a table holds the rows it holds: distinguishes "empty because the
/// file is missing" from "empty because the file is malformed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
  Loaded,
  Missing,
  Malformed { reason: String },
}

/// A loaded source table plus its provenance.
#[derive(Debug, Clone)]
pub struct Table<T> {
  pub rows:   Vec<T>,
  pub status: TableStatus,
}

impl<T> Table<T> {
  pub fn loaded(rows: Vec<T>) -> Self {
    Self { rows, status: TableStatus::Loaded }
  }

  pub fn missing() -> Self {
    Self { rows: Vec::new(), status: TableStatus::Missing }
  }

  pub fn malformed(reason: impl Into<String>) -> Self {
    Self {
      rows:   Vec::new(),
      status: TableStatus::Malformed { reason: reason.into() },
    }
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }
}

// ─── Reading ─────────────────────────────────────────────────────────────────

/// Read one source table from `dir`, degrading to an empty table on any
/// failure. A missing file and a malformed file are both non-fatal, and
/// neither blocks the other sources.
pub(crate) async fn read_table<T: DeserializeOwned>(
  dir: &Path,
  source: SourceName,
) -> Table<T> {
  let path = dir.join(source.file_name());

  let bytes = match tokio::fs::read(&path).await {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == ErrorKind::NotFound => return Table::missing(),
    Err(e) => {
      tracing::warn!(source = source.file_name(), error = %e, "unreadable source");
      return Table::malformed(e.to_string());
    }
  };

  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(bytes.as_slice());

  let mut rows = Vec::new();
  for record in reader.deserialize() {
    match record {
      Ok(row) => rows.push(row),
      // All-or-nothing: one bad record fails the file, which degrades to
      // an empty table rather than a partial one.
      Err(e) => {
        tracing::warn!(source = source.file_name(), error = %e, "malformed source");
        return Table::malformed(e.to_string());
      }
    }
  }

  Table::loaded(rows)
}
