//! Database module: view models and SQL repositories.
//!
//! - `model`: flattened view models returned by listing queries.
//! - `repo`: SQL-only functions that map rows into domain records.
//!
//! The repository API is re-exported at `crate::db::*`.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::ContentListing;
