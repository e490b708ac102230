use cms_setup::db;
use cms_setup::model::ADMIN_CHANNEL_ID;
use cms_setup::store::SqliteStore;
use cms_setup::{BlockOutcome, CmsError, CmsLoader};
use std::path::Path;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn loads_blocks_from_a_document() {
    let pool = setup_pool().await;
    let loader = CmsLoader::sqlite(SqliteStore::new(pool.clone()));
    let dir = tempfile::tempdir().unwrap();
    let doc = write(
        dir.path(),
        "cms.json",
        r#"{"blocks":[{"identifier":"b1","title":"T","content":"C"}]}"#,
    );

    let report = loader.create_from_document(&doc, None).await.unwrap();

    assert!(report.pages.is_empty());
    assert_eq!(report.blocks.len(), 1);
    let BlockOutcome::Created(block) = &report.blocks[0] else {
        panic!("expected a created block");
    };
    assert_eq!(block.identifier, "b1");
    assert_eq!(block.title, "T");
    assert_eq!(block.content, "C");
    assert_eq!(block.channels, vec![ADMIN_CHANNEL_ID]);
    assert_eq!(report.blocks_written(), 1);
}

#[tokio::test]
async fn content_file_wins_over_inline_content() {
    let pool = setup_pool().await;
    let loader = CmsLoader::sqlite(SqliteStore::new(pool.clone()));
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "footer.html", "<footer>from file</footer>");
    let doc = write(
        dir.path(),
        "cms.json",
        r#"{"blocks":[{"identifier":"footer","content":"inline","content_file":"/footer.html"}]}"#,
    );

    let report = loader
        .create_from_document(&doc, Some(dir.path()))
        .await
        .unwrap();

    let stored = db::blocks_by_identifier(&pool, "footer").await.unwrap();
    assert_eq!(stored[0].content, "<footer>from file</footer>");
    assert_eq!(report.blocks[0].blocks()[0].content, "<footer>from file</footer>");
}

#[tokio::test]
async fn default_directory_applies_when_none_is_given() {
    let pool = setup_pool().await;
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "home.html", "<h1>Home</h1>");
    let loader = CmsLoader::sqlite(SqliteStore::new(pool.clone()))
        .with_default_directory(Some(dir.path().to_path_buf()));
    let doc = write(
        dir.path(),
        "cms.json",
        r#"{"pages":[{"identifier":"home","title":"Home","content_file":"home.html"}]}"#,
    );

    let report = loader.create_from_document(&doc, None).await.unwrap();
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].content, "<h1>Home</h1>");
}

#[tokio::test]
async fn missing_content_file_stops_the_load() {
    let pool = setup_pool().await;
    let loader = CmsLoader::sqlite(SqliteStore::new(pool.clone()));
    let dir = tempfile::tempdir().unwrap();
    let doc = write(
        dir.path(),
        "cms.json",
        r#"{"blocks":[
            {"identifier":"first","content":"ok"},
            {"identifier":"second","content_file":"nope.html"},
            {"identifier":"third","content":"never"}
        ]}"#,
    );

    let err = loader
        .create_from_document(&doc, Some(dir.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, CmsError::ContentFileNotFound { .. }));
    assert_eq!(err.to_string(), "File not found (nope.html).");

    // Records before the failure stay written; later ones are never reached.
    assert_eq!(db::blocks_by_identifier(&pool, "first").await.unwrap().len(), 1);
    assert!(db::blocks_by_identifier(&pool, "second").await.unwrap().is_empty());
    assert!(db::blocks_by_identifier(&pool, "third").await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_document_is_reported_with_its_path() {
    let pool = setup_pool().await;
    let loader = CmsLoader::sqlite(SqliteStore::new(pool));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = loader.create_from_document(&path, None).await.unwrap_err();
    assert!(matches!(err, CmsError::MissingDocument { .. }));
    assert_eq!(
        err.to_string(),
        format!("JSON file doesn't exist ({}).", path.display())
    );

    // A directory is not a document either.
    let err = loader.create_from_document(dir.path(), None).await.unwrap_err();
    assert!(matches!(err, CmsError::MissingDocument { .. }));
}

#[tokio::test]
async fn malformed_document_names_the_file_and_writes_nothing() {
    let pool = setup_pool().await;
    let loader = CmsLoader::sqlite(SqliteStore::new(pool.clone()));
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "cms.json", r#"{"blocks":[{"identifier":"b1""#);

    let err = loader.create_from_document(&doc, None).await.unwrap_err();
    assert!(matches!(err, CmsError::MalformedDocument { .. }));
    assert!(err
        .to_string()
        .ends_with(&format!(" in file {}.", doc.display())));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blocks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn pages_load_before_blocks_and_upsert_by_identifier() {
    let pool = setup_pool().await;
    let fr = db::upsert_channel(&pool, "fr", "French").await.unwrap();
    let loader = CmsLoader::sqlite(SqliteStore::new(pool.clone()));
    let dir = tempfile::tempdir().unwrap();
    let first = write(
        dir.path(),
        "first.json",
        r#"{"pages":[{"identifier":"about","title":"About","content":"v1","meta_keywords":"about"}]}"#,
    );
    let second = write(
        dir.path(),
        "second.json",
        r#"{
            "blocks":[{"identifier":"about_block","content":"b","stores":["fr"]}],
            "pages":[{"identifier":"about","content":"v2","stores":["fr","unknown"]}]
        }"#,
    );

    loader.create_from_document(&first, None).await.unwrap();
    let report = loader.create_from_document(&second, None).await.unwrap();

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.blocks.len(), 1);

    let page = db::page_by_identifier(&pool, "about").await.unwrap().unwrap();
    assert_eq!(page.title, "About");
    assert_eq!(page.content, "v2");
    assert_eq!(page.meta_keywords.as_deref(), Some("about"));
    assert_eq!(page.channels, vec![fr]);

    let pages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(pages, 1);
}
