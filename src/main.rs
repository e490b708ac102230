use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use cms_setup::config;
use cms_setup::db;
use cms_setup::store::SqliteStore;
use cms_setup::CmsLoader;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Create and update CMS blocks and pages from a JSON document"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Base directory for `content_file` references (overrides app.content_dir)
    #[arg(long)]
    directory: Option<PathBuf>,

    /// JSON document with `blocks` and `pages`
    document: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    db::provision_channels(&pool, &cfg.channels).await?;

    let directory = args.directory.or_else(|| cfg.app.resolved_content_dir());
    info!(
        database_url = %database_url,
        document = %args.document.display(),
        "loading cms document"
    );

    let loader = CmsLoader::sqlite(SqliteStore::new(pool)).with_default_directory(directory);
    let report = loader.create_from_document(&args.document, None).await?;

    info!(
        pages = report.pages.len(),
        block_specs = report.blocks.len(),
        blocks_written = report.blocks_written(),
        "cms document loaded"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
