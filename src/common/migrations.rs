// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if they don't exist. Set RESET_DB=true to drop and
/// recreate the schema from scratch (development only, destroys data).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - dropping all tables and recreating schema...");
        sqlx::query("DROP TABLE IF EXISTS users").execute(pool).await?;
    }

    create_user_tables(pool).await?;

    info!("Database migration completed");

    Ok(())
}

/// Create the users table and its indexes
///
/// `email` carries the unique constraint that makes upsert-by-email safe
/// under concurrent authentication requests: the losing INSERT fails with a
/// unique violation and is retried as an UPDATE by the resolver.
pub async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            google_id TEXT,
            first_name TEXT,
            last_name TEXT,
            profile_picture TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_google_id ON users(google_id)")
        .execute(pool)
        .await?;

    Ok(())
}
