use super::model::ContentListing;
use crate::config::ChannelConfig;
use crate::model::{Block, Channel, Page, ADMIN_CHANNEL_ID};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use tracing::{info, instrument};

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized)
        .await
        .with_context(|| format!("failed to open database {}", normalized))?;
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// Expand a leading `~/` in file-backed SQLite URLs, create the parent
/// directory, and ask SQLite to create the file. In-memory URLs pass through.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let query = match query_part {
        Some(q) if q.contains("mode=") => q.to_string(),
        Some(q) => format!("{}&mode=rwc", q),
        None => "mode=rwc".to_string(),
    };
    format!("sqlite://{}?{}", expanded_path, query)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

fn channel_from_row(row: &SqliteRow) -> Channel {
    Channel {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
    }
}

#[instrument(skip_all)]
pub async fn find_channel_by_code(pool: &Pool, code: &str) -> Result<Option<Channel>> {
    let row = sqlx::query("SELECT id, code, name FROM channels WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(channel_from_row))
}

#[instrument(skip_all)]
pub async fn find_channel_by_id(pool: &Pool, id: i64) -> Result<Option<Channel>> {
    let row = sqlx::query("SELECT id, code, name FROM channels WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(channel_from_row))
}

pub async fn list_channels(pool: &Pool) -> Result<Vec<Channel>> {
    let rows = sqlx::query("SELECT id, code, name FROM channels ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(channel_from_row).collect())
}

/// Insert the channel, or rename it if the code already exists. Returns its id.
#[instrument(skip_all)]
pub async fn upsert_channel(pool: &Pool, code: &str, name: &str) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO channels (code, name) VALUES (?, ?) \
         ON CONFLICT(code) DO UPDATE SET name = excluded.name RETURNING id",
    )
    .bind(code)
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Create or rename every configured channel, returning them in config order.
#[instrument(skip_all)]
pub async fn provision_channels(pool: &Pool, channels: &[ChannelConfig]) -> Result<Vec<Channel>> {
    let mut out = Vec::with_capacity(channels.len());
    for channel in channels {
        let code = channel.code.trim();
        let id = upsert_channel(pool, code, channel.name.trim()).await?;
        info!(id, code, "channel provisioned");
        out.push(Channel {
            id,
            code: code.to_string(),
            name: channel.name.trim().to_string(),
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Fold `blocks LEFT JOIN block_channels` rows (ordered by block id) into blocks.
fn fold_block_rows(rows: &[SqliteRow]) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    for row in rows {
        let id: i64 = row.get("id");
        if blocks.last().and_then(|b| b.id) != Some(id) {
            blocks.push(Block {
                id: Some(id),
                identifier: row.get("identifier"),
                title: row.get("title"),
                content: row.get("content"),
                is_active: row.get("is_active"),
                channels: Vec::new(),
                created_at: row.get::<Option<DateTime<Utc>>, _>("created_at"),
                updated_at: row.get::<Option<DateTime<Utc>>, _>("updated_at"),
            });
        }
        if let Some(channel_id) = row.get::<Option<i64>, _>("channel_id") {
            if let Some(block) = blocks.last_mut() {
                block.channels.push(channel_id);
            }
        }
    }
    blocks
}

/// All blocks sharing `identifier`, each with its channel set, in one query.
#[instrument(skip_all, fields(identifier = %identifier))]
pub async fn blocks_by_identifier(pool: &Pool, identifier: &str) -> Result<Vec<Block>> {
    let rows = sqlx::query(
        "SELECT b.id, b.identifier, b.title, b.content, b.is_active, b.created_at, b.updated_at, \
                bc.channel_id \
         FROM blocks b \
         LEFT JOIN block_channels bc ON bc.block_id = b.id \
         WHERE b.identifier = ? \
         ORDER BY b.id, bc.channel_id",
    )
    .bind(identifier)
    .fetch_all(pool)
    .await?;
    Ok(fold_block_rows(&rows))
}

async fn block_channel_conflicts(
    tx: &mut Transaction<'_, Sqlite>,
    block: &Block,
) -> Result<Vec<i64>> {
    let taken: Vec<i64> = sqlx::query_scalar(
        "SELECT bc.channel_id FROM blocks b \
         JOIN block_channels bc ON bc.block_id = b.id \
         WHERE b.identifier = ? AND b.id != ?",
    )
    .bind(&block.identifier)
    .bind(block.id.unwrap_or(-1))
    .fetch_all(&mut **tx)
    .await?;
    let global = block.channels.contains(&ADMIN_CHANNEL_ID);
    Ok(taken
        .into_iter()
        .filter(|c| global || *c == ADMIN_CHANNEL_ID || block.channels.contains(c))
        .collect())
}

/// Drop repeated channel ids, keeping the first occurrence.
fn dedup_channels(channels: &mut Vec<i64>) {
    let mut seen = HashSet::new();
    channels.retain(|c| seen.insert(*c));
}

async fn replace_channels(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    owner_column: &str,
    owner_id: i64,
    channels: &[i64],
) -> Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?", table, owner_column))
        .bind(owner_id)
        .execute(&mut **tx)
        .await?;
    for channel_id in channels {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} ({}, channel_id) VALUES (?, ?)",
            table, owner_column
        ))
        .bind(owner_id)
        .bind(channel_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Insert or update a block and its channel assignment in one transaction.
///
/// Rejects the save when another block with the same identifier already
/// serves one of the block's channels. A block on the admin channel collides
/// with every other block of its identifier.
#[instrument(skip_all, fields(identifier = %block.identifier))]
pub async fn save_block(pool: &Pool, block: &mut Block) -> Result<()> {
    dedup_channels(&mut block.channels);
    let mut tx = pool.begin().await?;

    let conflicts = block_channel_conflicts(&mut tx, block).await?;
    if !conflicts.is_empty() {
        return Err(anyhow!(
            "A block identifier with the same properties already exists \
             in the selected store ({}, channels {:?}).",
            block.identifier,
            conflicts
        ));
    }

    let now = Utc::now();
    let id = match block.id {
        Some(id) => {
            let res = sqlx::query(
                "UPDATE blocks SET identifier = ?, title = ?, content = ?, is_active = ?, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&block.identifier)
            .bind(&block.title)
            .bind(&block.content)
            .bind(block.is_active)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            if res.rows_affected() == 0 {
                return Err(anyhow!("block {} not found", id));
            }
            id
        }
        None => {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO blocks \
                 (identifier, title, content, is_active, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
            )
            .bind(&block.identifier)
            .bind(&block.title)
            .bind(&block.content)
            .bind(block.is_active)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            block.created_at = Some(now);
            id
        }
    };

    replace_channels(&mut tx, "block_channels", "block_id", id, &block.channels).await?;
    tx.commit().await?;

    block.id = Some(id);
    block.updated_at = Some(now);
    Ok(())
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[instrument(skip_all, fields(identifier = %identifier))]
pub async fn page_by_identifier(pool: &Pool, identifier: &str) -> Result<Option<Page>> {
    let rows = sqlx::query(
        "SELECT p.id, p.identifier, p.title, p.content, p.content_heading, p.root_template, \
                p.meta_keywords, p.meta_description, p.is_active, p.created_at, p.updated_at, \
                pc.channel_id \
         FROM pages p \
         LEFT JOIN page_channels pc ON pc.page_id = p.id \
         WHERE p.identifier = ? \
         ORDER BY pc.channel_id",
    )
    .bind(identifier)
    .fetch_all(pool)
    .await?;

    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let mut page = Page {
        id: Some(first.get("id")),
        identifier: first.get("identifier"),
        title: first.get("title"),
        content: first.get("content"),
        content_heading: first.get("content_heading"),
        root_template: first.get("root_template"),
        meta_keywords: first.get("meta_keywords"),
        meta_description: first.get("meta_description"),
        is_active: first.get("is_active"),
        channels: Vec::new(),
        created_at: first.get::<Option<DateTime<Utc>>, _>("created_at"),
        updated_at: first.get::<Option<DateTime<Utc>>, _>("updated_at"),
    };
    page.channels = rows
        .iter()
        .filter_map(|r| r.get::<Option<i64>, _>("channel_id"))
        .collect();
    Ok(Some(page))
}

/// Insert or update a page and replace its channel assignment.
#[instrument(skip_all, fields(identifier = %page.identifier))]
pub async fn save_page(pool: &Pool, page: &mut Page) -> Result<()> {
    dedup_channels(&mut page.channels);
    let mut tx = pool.begin().await?;
    let now = Utc::now();
    let id = match page.id {
        Some(id) => {
            let res = sqlx::query(
                "UPDATE pages SET identifier = ?, title = ?, content = ?, content_heading = ?, \
                 root_template = ?, meta_keywords = ?, meta_description = ?, is_active = ?, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&page.identifier)
            .bind(&page.title)
            .bind(&page.content)
            .bind(&page.content_heading)
            .bind(&page.root_template)
            .bind(&page.meta_keywords)
            .bind(&page.meta_description)
            .bind(page.is_active)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            if res.rows_affected() == 0 {
                return Err(anyhow!("page {} not found", id));
            }
            id
        }
        None => {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO pages (identifier, title, content, content_heading, root_template, \
                 meta_keywords, meta_description, is_active, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            )
            .bind(&page.identifier)
            .bind(&page.title)
            .bind(&page.content)
            .bind(&page.content_heading)
            .bind(&page.root_template)
            .bind(&page.meta_keywords)
            .bind(&page.meta_description)
            .bind(page.is_active)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            page.created_at = Some(now);
            id
        }
    };

    replace_channels(&mut tx, "page_channels", "page_id", id, &page.channels).await?;
    tx.commit().await?;

    page.id = Some(id);
    page.updated_at = Some(now);
    Ok(())
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

fn fold_listing_rows(kind: &'static str, rows: &[SqliteRow]) -> Vec<ContentListing> {
    let mut out: Vec<ContentListing> = Vec::new();
    for row in rows {
        let id: i64 = row.get("id");
        if out.last().map(|l| l.id) != Some(id) {
            out.push(ContentListing {
                kind,
                id,
                identifier: row.get("identifier"),
                title: row.get("title"),
                is_active: row.get("is_active"),
                channels: Vec::new(),
                updated_at: row.get::<Option<DateTime<Utc>>, _>("updated_at"),
            });
        }
        if let Some(code) = row.get::<Option<String>, _>("code") {
            if let Some(listing) = out.last_mut() {
                listing.channels.push(code);
            }
        }
    }
    out
}

/// Blocks with their channel codes, optionally limited to one identifier.
pub async fn list_blocks(pool: &Pool, identifier: Option<&str>) -> Result<Vec<ContentListing>> {
    let rows = sqlx::query(
        "SELECT b.id, b.identifier, b.title, b.is_active, b.updated_at, c.code \
         FROM blocks b \
         LEFT JOIN block_channels bc ON bc.block_id = b.id \
         LEFT JOIN channels c ON c.id = bc.channel_id \
         WHERE ?1 IS NULL OR b.identifier = ?1 \
         ORDER BY b.identifier, b.id, c.id",
    )
    .bind(identifier)
    .fetch_all(pool)
    .await?;
    Ok(fold_listing_rows("block", &rows))
}

/// Pages with their channel codes, optionally limited to one identifier.
pub async fn list_pages(pool: &Pool, identifier: Option<&str>) -> Result<Vec<ContentListing>> {
    let rows = sqlx::query(
        "SELECT p.id, p.identifier, p.title, p.is_active, p.updated_at, c.code \
         FROM pages p \
         LEFT JOIN page_channels pc ON pc.page_id = p.id \
         LEFT JOIN channels c ON c.id = pc.channel_id \
         WHERE ?1 IS NULL OR p.identifier = ?1 \
         ORDER BY p.identifier, p.id, c.id",
    )
    .bind(identifier)
    .fetch_all(pool)
    .await?;
    Ok(fold_listing_rows("page", &rows))
}
