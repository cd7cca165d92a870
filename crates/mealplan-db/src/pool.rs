//! Connecting to the planner database and bringing its schema up to date.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Schema migrations, compiled in from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables created by the migrations, in dependency order.
pub const TABLES: [&str; 7] = [
    "households",
    "profiles",
    "recipes",
    "planning_rules",
    "meal_plans",
    "planned_meals",
    "recipe_usage",
];

const POOL_SIZE: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("cannot reach PostgreSQL at {url}"))
}

/// Pool used by the planner commands.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = connect(&config.database_url, POOL_SIZE).await?;
    debug!(max_connections = POOL_SIZE, "database pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("applying schema migrations")?;
    info!(migrations = MIGRATOR.iter().count(), "schema is up to date");
    Ok(())
}

/// Create the configured database through the `postgres` maintenance
/// database unless it is already there.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let name = config.creatable_database_name()?;
    let admin = connect(&config.maintenance_url(), 1).await?;

    let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(name)
        .fetch_optional(&admin)
        .await
        .with_context(|| format!("looking up database {name}"))?;

    if found.is_none() {
        admin
            .execute(format!("CREATE DATABASE \"{name}\"").as_str())
            .await
            .with_context(|| format!("creating database {name}"))?;
        info!(db = name, "created database");
    } else {
        debug!(db = name, "database present");
    }

    admin.close().await;
    Ok(())
}

/// Row count of each planner table, in [`TABLES`] order.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("counting rows in {table}"))?;
        counts.push((table.to_owned(), rows));
    }
    Ok(counts)
}
