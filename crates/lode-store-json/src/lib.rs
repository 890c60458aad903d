//! Whole-file JSON implementation of [`lode_core::store::UserStore`].
//!
//! The persisted format is a single document:
//!
//! ```json
//! { "users": [ { "id": 1, "username": "admin", ... } ], "next_id": 2 }
//! ```
//!
//! Every save replaces the whole file via write-to-temp-then-rename, so a
//! crash mid-write cannot leave a half-written store. There is no file
//! lock: concurrent writers from separate processes are last-write-wins on
//! the whole file, an accepted limitation for a low-concurrency internal
//! tool.

pub mod error;
pub mod store;


pub use error::{Error, Result};
pub use store::{JsonUserStore, SEED_ADMIN_PASSWORD, SEED_ADMIN_USERNAME};
