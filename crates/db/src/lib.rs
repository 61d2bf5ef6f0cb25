//! Database initialization and migration logic for the booking backend.
//!
//! Provides `init_db_pool` for creating a connection pool and
//! `run_migrations` for applying the SQL files of the migrations directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use app_config::AppConfig;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio::fs;
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tracing::info;

/// Initializes the database connection pool and runs migrations.
///
/// # Errors
/// Returns an error if the pool cannot be created or migrations fail.
pub async fn init_db_pool(cfg: &AppConfig) -> Result<Pool> {
    let pool = create_pool(cfg)?;

    let client = pool.get().await.context("Failed to get DB connection for migrations")?;
    run_migrations(&client, &cfg.migrations_dir).await?;

    Ok(pool)
}

/// Builds the pool without touching the database.
pub fn create_pool(cfg: &AppConfig) -> Result<Pool> {
    let pg_config: PgConfig = cfg.database_dsn().parse()
        .context("Failed to parse Postgres DSN")?;

    let mgr = Manager::from_config(pg_config, NoTls, ManagerConfig { recycling_method: RecyclingMethod::Fast });
    Pool::builder(mgr)
        .max_size(cfg.db_pool_size)
        .wait_timeout(Some(cfg.db_wait_timeout))
        .runtime(Runtime::Tokio1)
        .build()
        .context("Failed to create database pool")
}

/// Applies all `.sql` files from `migrations_dir` in file-name order.
///
/// Migrations must be idempotent (`CREATE ... IF NOT EXISTS`); they run on every start.
///
/// # Errors
/// Returns an error if migration files cannot be read or applied.
pub async fn run_migrations(client: &Client, migrations_dir: &str) -> Result<()> {
    for path in migration_files(migrations_dir).await? {
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        info!("Applying migration: {}", file_name);
        let content = fs::read_to_string(&path).await
            .with_context(|| format!("Failed to read migration file {}", file_name))?;

        client.batch_execute(&content)
            .await
            .with_context(|| format!("Failed to execute migration {}", file_name))?;
    }
    Ok(())
}

async fn migration_files(migrations_dir: &str) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(migrations_dir).await
        .with_context(|| format!("Failed to read migrations directory {}", migrations_dir))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_sql(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_sql(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sql")
}
