//! View models returned by listing queries.
//!
//! Domain records (`Block`, `Page`, `Channel`) live in `crate::model`; the
//! structs here are flattened slices meant for display.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stored block or page with its channel codes resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ContentListing {
    pub kind: &'static str,
    pub id: i64,
    pub identifier: String,
    pub title: String,
    pub is_active: bool,
    pub channels: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
