/// Cleaning Service Booking Backend
///
/// Operational entry point: connects to PostgreSQL, applies migrations,
/// makes sure a manager account exists and runs one sub-command.
///
/// # Architecture
///
/// - Repository layer for data access (`repository`)
/// - Service layer for business logic (`service`)
/// - This binary wires both together over a deadpool pool
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use app_config::AppConfig;
use repository::{PgOrderRepository, PgTaskRepository, PgUserRepository, PgWorkerRepository};
use service::{Argon2Hasher, OrderServiceImpl, TaskServiceImpl, WorkerServiceImpl};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cleaning-backend", version, about = "Cleaning service booking backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply SQL migrations and exit.
    Migrate,
    /// Create the default manager account if no manager exists.
    InitAdmin,
    /// Print the price list grouped by category.
    PriceList,
    /// Print status, worker, lines and total price of an order.
    OrderSummary {
        #[arg(long)]
        id: Uuid,
    },
}

/// Initialize the tracing subscriber for logging; `RUST_LOG` wins over the configured level.
fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logger(&config.log_level);

    info!("Cleaning service backend starting...");

    let pool = db::init_db_pool(&config).await.inspect_err(|e| {
        error!("Failed to initialize database: {}", e);
    })?;
    info!("Database initialized successfully");

    if matches!(cli.command, Command::Migrate) {
        info!("Migrations applied");
        return Ok(());
    }

    let workers = WorkerServiceImpl::new(PgWorkerRepository::new(pool.clone()), Argon2Hasher);
    commands::ensure_default_admin(&workers, &config)
        .await
        .context("Failed to create default admin")?;

    match cli.command {
        Command::Migrate | Command::InitAdmin => {}
        Command::PriceList => {
            let tasks = TaskServiceImpl::new(PgTaskRepository::new(pool.clone()));
            print!("{}", commands::price_list(&tasks).await?);
        }
        Command::OrderSummary { id } => {
            let orders = OrderServiceImpl::new(
                PgOrderRepository::new(pool.clone()),
                PgTaskRepository::new(pool.clone()),
                PgWorkerRepository::new(pool.clone()),
                PgUserRepository::new(pool.clone()),
            );
            print!("{}", commands::order_summary(&orders, &workers, id).await?);
        }
    }

    info!("Application stopped");
    Ok(())
}
