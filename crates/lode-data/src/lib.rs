//! Data-integration layer for the Lode minerals data service.
//!
//! Loads the four tabular CSV sources and joins them into query-ready
//! views, cached as an immutable snapshot until explicitly invalidated.
//! Degradation is always graceful: a missing or malformed source becomes
//! an empty table, and an impossible join becomes an absent view, never an
//! error surfaced to the dashboard.

pub mod error;
pub mod map;
pub mod repository;
pub mod source;
pub mod summary;


pub use error::{Error, Result};
pub use repository::{DataRepository, Snapshot};
pub use source::{SourceName, Table, TableStatus};
