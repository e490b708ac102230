use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::spec::{content_file, BlockSpec};
use super::CmsLoader;
use crate::channels::target_channels;
use crate::error::CmsError;
use crate::model::BlockOutcome;

impl CmsLoader {
    /// Create a block, or update the existing blocks it targets.
    ///
    /// Without `update`, exactly one new block is saved. With `update`, every
    /// stored block carrying the same identifier whose channels overlap the
    /// target channels of the `BlockSpec` gets its fields merged in and is saved;
    /// blocks on other channels are left untouched, and nothing is created
    /// when no block overlaps.
    #[instrument(skip_all, fields(identifier = %spec.identifier, update = spec.update))]
    pub async fn create_block(
        &self,
        mut spec: BlockSpec,
        directory: Option<&Path>,
    ) -> Result<BlockOutcome, CmsError> {
        spec.validate()?;
        self.substitute_content(&mut spec.content, content_file(&spec.content_file), directory)
            .await?;

        let targets = target_channels(self.channels.as_ref(), spec.stores.as_deref()).await?;

        if !spec.update {
            let mut block = spec.to_new_block(targets)?;
            self.store.save_block(&mut block).await?;
            info!(id = ?block.id, channels = ?block.channels, "block created");
            return Ok(BlockOutcome::Created(block));
        }

        let existing = self.store.blocks_by_identifier(&spec.identifier).await?;
        if existing.is_empty() {
            warn!("no stored block to update");
        }

        let mut updated = Vec::new();
        for mut block in existing {
            if !block.serves_any(&targets) {
                debug!(
                    id = ?block.id,
                    channels = ?block.channels,
                    "block on other channels left untouched"
                );
                continue;
            }
            spec.merge_into(&mut block);
            self.store.save_block(&mut block).await?;
            info!(id = ?block.id, channels = ?block.channels, "block updated");
            updated.push(block);
        }
        Ok(BlockOutcome::Updated(updated))
    }

    /// Load every block spec in order, stopping at the first error.
    pub async fn create_blocks(
        &self,
        specs: Vec<BlockSpec>,
        directory: Option<&Path>,
    ) -> Result<Vec<BlockOutcome>, CmsError> {
        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            outcomes.push(self.create_block(spec, directory).await?);
        }
        Ok(outcomes)
    }
}
