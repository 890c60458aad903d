//! Error type for `lode-data`.
//!
//! Deliberately small: source-table parse failures are not errors here (a
//! failed table degrades to an empty one with recorded provenance), so the
//! only caller-visible failures are a bad upload name and raw I/O on the
//! upload path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The upload name is not one of the four canonical source filenames.
  /// Rejected before any side effect.
  #[error(
    "{0:?} is not a source file; use countries.csv, minerals.csv, \
     production_stats.csv or sites.csv"
  )]
  InvalidSourceName(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
