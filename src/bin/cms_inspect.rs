use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cms_setup::config;
use cms_setup::db;
use serde_json::json;

/// Print stored channels, blocks and pages as JSON.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Only show records with this identifier
    #[arg(long)]
    identifier: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let identifier = args.identifier.as_deref();
    let out = json!({
        "channels": db::list_channels(&pool).await?,
        "blocks": db::list_blocks(&pool, identifier).await?,
        "pages": db::list_pages(&pool, identifier).await?,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
