use anyhow::Result;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{fs, io::ErrorKind, path::Path, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

/// Schema for containers and object metadata, applied idempotently at boot.
const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate_only) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting image-store with config: {:?}", cfg);

    // --- Ensure storage directory exists ---
    if !Path::new(&cfg.storage_dir).exists() {
        fs::create_dir_all(&cfg.storage_dir)?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir);
    }

    // --- Initialize SQLite connection ---
    let db = connect_db(&cfg.database_url).await?;

    // --- Apply schema (idempotent); optionally exit after migrating ---
    run_migrations(&db).await?;
    if migrate_only {
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    // --- Initialize core service ---
    let store = services::fs_blob_store::FsBlobStore::new(
        db.clone(),
        cfg.storage_dir.clone(),
        cfg.public_base_url(),
    );
    let state = handlers::AppState {
        blobs: Arc::new(store),
        container: cfg.container.clone(),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        "Server listening on http://{} (uploads go to container `{}`, served at {})",
        listener.local_addr()?,
        cfg.container,
        cfg.public_base_url()
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the SQLite pool, provisioning the filesystem on first boot.
///
/// SQLx creates neither missing parent directories nor, by default, the
/// database file itself, so a fresh deployment needs both handled here.
async fn connect_db(db_url: &str) -> Result<Arc<sqlx::Pool<sqlx::Sqlite>>> {
    tracing::debug!("Connecting using raw URL => {}", db_url);

    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(Arc::new(db))
}

/// Run the embedded schema statements one by one.
async fn run_migrations(db: &Arc<sqlx::Pool<sqlx::Sqlite>>) -> Result<()> {
    let statements = INIT_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::debug!("Running {} migration statements...", statements.len());

    for stmt in statements {
        sqlx::query(stmt).execute(&**db).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn fresh_deployment_creates_database_file_and_schema() {
        let dir = TempDir::new().expect("temp dir");
        let db_url = format!("sqlite://{}/meta/image_store.db", dir.path().display());

        // Neither the meta directory nor the db file exist yet.
        let db = connect_db(&db_url).await.expect("first connect");
        run_migrations(&db).await.expect("migrations");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM containers")
            .fetch_one(&*db)
            .await
            .expect("schema usable");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn reconnecting_to_an_existing_database_keeps_data() {
        let dir = TempDir::new().expect("temp dir");
        let db_url = format!("sqlite://{}/image_store.db", dir.path().display());

        let db = connect_db(&db_url).await.expect("first connect");
        run_migrations(&db).await.expect("migrations");
        sqlx::query("INSERT INTO containers (id, name, public_read, created_at) VALUES (?, ?, 1, ?)")
            .bind(uuid::Uuid::new_v4())
            .bind("profilepics")
            .bind(chrono::Utc::now())
            .execute(&*db)
            .await
            .expect("seed row");
        db.close().await;

        let db = connect_db(&db_url).await.expect("reconnect");
        run_migrations(&db).await.expect("migrations are idempotent");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM containers")
            .fetch_one(&*db)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
