use std::path::Path;
use tracing::{info, instrument};

use super::spec::{content_file, PageSpec};
use super::CmsLoader;
use crate::channels::target_channels;
use crate::error::CmsError;
use crate::model::Page;

impl CmsLoader {
    /// Upsert a page by identifier. The page's channels are replaced by the
    /// spec's target channels.
    #[instrument(skip_all, fields(identifier = %spec.identifier))]
    pub async fn create_page(
        &self,
        mut spec: PageSpec,
        directory: Option<&Path>,
    ) -> Result<Page, CmsError> {
        spec.validate()?;
        self.substitute_content(&mut spec.content, content_file(&spec.content_file), directory)
            .await?;

        let targets = target_channels(self.channels.as_ref(), spec.stores.as_deref()).await?;

        let mut page = match self.store.page_by_identifier(&spec.identifier).await? {
            Some(page) => page,
            None => Page::new(spec.identifier.clone()),
        };
        let is_new = page.id.is_none();
        spec.merge_into(&mut page)?;
        page.channels = targets;
        self.store.save_page(&mut page).await?;

        info!(id = ?page.id, channels = ?page.channels, created = is_new, "page saved");
        Ok(page)
    }

    pub async fn create_pages(
        &self,
        specs: Vec<PageSpec>,
        directory: Option<&Path>,
    ) -> Result<Vec<Page>, CmsError> {
        let mut pages = Vec::with_capacity(specs.len());
        for spec in specs {
            pages.push(self.create_page(spec, directory).await?);
        }
        Ok(pages)
    }
}
