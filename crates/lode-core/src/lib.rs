//! Core types and trait definitions for the Lode minerals data service.
//!
//! This crate is deliberately free of HTTP and file-system dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod record;
pub mod role;
pub mod store;
pub mod user;

pub use error::{Error, Result};
