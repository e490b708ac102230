//! Batch loading of CMS blocks and pages.
//!
//! The flow for every record spec is:
//!
//! ```text
//! spec ─► content_file substitution ─► channel resolution ─┬─► block: create, or update overlapping blocks
//!                                                          └─► page:  upsert by identifier
//! ```
//!
//! `CmsLoader` holds no state besides its collaborators; everything it writes
//! goes through the injected `RecordStore`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::content::{ContentLoader, FsContentLoader};
use crate::error::CmsError;
use crate::store::{ChannelDirectory, RecordStore, SqliteStore};

mod block;
mod document;
mod page;
pub mod spec;

pub use spec::{BlockSpec, CmsDocument, PageSpec};

#[derive(Clone)]
pub struct CmsLoader {
    store: Arc<dyn RecordStore>,
    channels: Arc<dyn ChannelDirectory>,
    content: Arc<dyn ContentLoader>,
    default_directory: Option<PathBuf>,
}

impl CmsLoader {
    pub fn new(
        store: Arc<dyn RecordStore>,
        channels: Arc<dyn ChannelDirectory>,
        content: Arc<dyn ContentLoader>,
    ) -> Self {
        Self {
            store,
            channels,
            content,
            default_directory: None,
        }
    }

    /// Loader writing to SQLite and reading content files from disk.
    pub fn sqlite(store: SqliteStore) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, Arc::new(FsContentLoader))
    }

    /// Base directory used for `content_file` when a call passes none.
    pub fn with_default_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.default_directory = directory;
        self
    }

    fn directory<'a>(&'a self, directory: Option<&'a Path>) -> Option<&'a Path> {
        directory.or(self.default_directory.as_deref())
    }

    /// Replace `content` with the file's contents when `content_file` is set.
    async fn substitute_content(
        &self,
        content: &mut Option<String>,
        content_file: Option<&str>,
        directory: Option<&Path>,
    ) -> Result<(), CmsError> {
        if let Some(filename) = content_file {
            *content = Some(self.content.load(self.directory(directory), filename).await?);
        }
        Ok(())
    }
}
