use anyhow::Result;
use tracing::debug;

use crate::model::{ChannelRef, ADMIN_CHANNEL_ID};
use crate::store::ChannelDirectory;

/// Map channel refs to channel ids, in input order.
///
/// Refs that do not name an existing channel are dropped without error;
/// duplicates are kept. Only a failing lookup is an error.
pub async fn resolve_channels(
    directory: &dyn ChannelDirectory,
    refs: &[ChannelRef],
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(refs.len());
    for channel_ref in refs {
        match directory.find_channel(channel_ref).await? {
            Some(channel) => ids.push(channel.id),
            None => debug!(channel = %channel_ref, "unknown channel skipped"),
        }
    }
    Ok(ids)
}

/// Channels targeted by a record: the resolved `stores`, or the admin channel
/// when the record names none.
pub async fn target_channels(
    directory: &dyn ChannelDirectory,
    stores: Option<&[ChannelRef]>,
) -> Result<Vec<i64>> {
    match stores {
        Some(refs) => resolve_channels(directory, refs).await,
        None => Ok(vec![ADMIN_CHANNEL_ID]),
    }
}
