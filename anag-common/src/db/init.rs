//! Database initialization
//!
//! Creates the database file on first run and applies the schema. Every
//! statement is `CREATE ... IF NOT EXISTS`, so opening an existing database
//! is a no-op.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign_keys is a per-connection pragma, so it goes on the connect options
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to a single connection that never expires: every pooled
/// connection to `:memory:` would otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Apply the schema (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // Geographic hierarchy (written by the importer)
    create_countries_table(pool).await?;
    create_regions_table(pool).await?;
    create_cities_table(pool).await?;

    // Contact management (reads the hierarchy)
    create_branches_table(pool).await?;
    create_registry_types_table(pool).await?;
    create_registers_table(pool).await?;
    create_contacts_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_countries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS countries (
            iso_code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Regions are unique per (country, name); code is not part of identity
async fn create_regions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regions (
            guid TEXT PRIMARY KEY,
            country_iso TEXT NOT NULL REFERENCES countries(iso_code) ON DELETE CASCADE,
            name TEXT NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(country_iso, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_cities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cities (
            guid TEXT PRIMARY KEY,
            region_guid TEXT NOT NULL REFERENCES regions(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            postcode TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(region_guid, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_branches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS branches (
            guid TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_registry_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registry_types (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_registers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registers (
            guid TEXT PRIMARY KEY,
            registry_type_guid TEXT REFERENCES registry_types(guid) ON DELETE SET NULL,
            last_name TEXT NOT NULL,
            first_name TEXT,
            phone TEXT,
            phone_ext TEXT,
            mobile TEXT,
            email TEXT NOT NULL,
            vat_number TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            guid TEXT PRIMARY KEY,
            register_guid TEXT NOT NULL REFERENCES registers(guid) ON DELETE CASCADE,
            branch_guid TEXT NOT NULL REFERENCES branches(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            phone TEXT,
            phone_ext TEXT,
            email TEXT NOT NULL,
            country_iso TEXT NOT NULL REFERENCES countries(iso_code) ON DELETE CASCADE,
            region_guid TEXT NOT NULL REFERENCES regions(guid) ON DELETE CASCADE,
            city_guid TEXT NOT NULL REFERENCES cities(guid) ON DELETE CASCADE,
            address TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
