//! Batch loader for CMS blocks and pages, scoped to distribution channels.

pub mod channels;
pub mod cms;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod model;
pub mod store;

pub use cms::{BlockSpec, CmsDocument, CmsLoader, PageSpec};
pub use error::CmsError;
pub use model::{Block, BlockOutcome, Channel, ChannelRef, CmsReport, Page};
