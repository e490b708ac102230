use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use super::spec::CmsDocument;
use super::CmsLoader;
use crate::error::CmsError;
use crate::model::CmsReport;

/// Parse a CMS document, attributing decoder errors to `path`.
pub fn parse_document(path: &Path, json: &str) -> Result<CmsDocument, CmsError> {
    serde_json::from_str(json).map_err(|source| CmsError::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

impl CmsLoader {
    /// Load the pages and then the blocks of the JSON document at `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn create_from_document(
        &self,
        path: &Path,
        directory: Option<&Path>,
    ) -> Result<CmsReport, CmsError> {
        let is_file = fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(CmsError::MissingDocument {
                path: path.to_path_buf(),
            });
        }

        let json = fs::read_to_string(path)
            .await
            .map_err(|source| CmsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let document = parse_document(path, &json)?;
        info!(
            pages = document.pages.len(),
            blocks = document.blocks.len(),
            "document parsed"
        );

        let pages = self.create_pages(document.pages, directory).await?;
        let blocks = self.create_blocks(document.blocks, directory).await?;
        Ok(CmsReport { pages, blocks })
    }
}
