//! Collaborator seams used by the loader, and their SQLite implementation.
use anyhow::Result;
use async_trait::async_trait;

use crate::db::{self, Pool};
use crate::model::{Block, Channel, ChannelRef, Page};

/// Persistence for blocks and pages, always loaded together with their channels.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every block whose identifier equals `identifier`.
    async fn blocks_by_identifier(&self, identifier: &str) -> Result<Vec<Block>>;

    /// Insert (when `block.id` is `None`) or update the block, then refresh
    /// its id and timestamps.
    async fn save_block(&self, block: &mut Block) -> Result<()>;

    async fn page_by_identifier(&self, identifier: &str) -> Result<Option<Page>>;

    async fn save_page(&self, page: &mut Page) -> Result<()>;
}

/// Lookup of channels by code or id.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn find_channel(&self, channel: &ChannelRef) -> Result<Option<Channel>>;
}

/// `RecordStore` and `ChannelDirectory` backed by the SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn blocks_by_identifier(&self, identifier: &str) -> Result<Vec<Block>> {
        db::blocks_by_identifier(&self.pool, identifier).await
    }

    async fn save_block(&self, block: &mut Block) -> Result<()> {
        db::save_block(&self.pool, block).await
    }

    async fn page_by_identifier(&self, identifier: &str) -> Result<Option<Page>> {
        db::page_by_identifier(&self.pool, identifier).await
    }

    async fn save_page(&self, page: &mut Page) -> Result<()> {
        db::save_page(&self.pool, page).await
    }
}

#[async_trait]
impl ChannelDirectory for SqliteStore {
    async fn find_channel(&self, channel: &ChannelRef) -> Result<Option<Channel>> {
        match channel {
            ChannelRef::Id(id) => db::find_channel_by_id(&self.pool, *id).await,
            ChannelRef::Code(code) => db::find_channel_by_code(&self.pool, code).await,
        }
    }
}
