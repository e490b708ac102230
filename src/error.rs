//! Errors surfaced by the content loader.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("JSON file doesn't exist ({}).", .path.display())]
    MissingDocument { path: PathBuf },

    #[error("The JSON is malformed ({source}) in file {}.", .path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("File not found ({filename}).")]
    ContentFileNotFound { filename: String },

    #[error("{kind} '{identifier}' is missing required field '{field}'.")]
    MissingField {
        kind: &'static str,
        identifier: String,
        field: &'static str,
    },

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by the record store, passed through unchanged.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}
