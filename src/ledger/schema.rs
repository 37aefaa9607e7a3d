/*!
 * Ledger schema definitions and migrations.
 *
 * SQL schema for the quota ledger tables and versioned migration on open.
 */

use log::{debug, info};
use rusqlite::Connection;

use crate::errors::QuotaError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the ledger schema
pub fn initialize_schema(conn: &Connection) -> Result<(), QuotaError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing ledger schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating ledger schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Ledger schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32, QuotaError> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), QuotaError> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all ledger tables
fn create_all_tables(conn: &Connection) -> Result<(), QuotaError> {
    // WAL mode for better concurrency and crash recovery
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Spendable credits per shop
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS balances (
            shop_id TEXT PRIMARY KEY,
            credits INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Pending holds against a shop balance. Terminal rows are kept for
    // audit rather than deleted.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS credit_reservations (
            id TEXT PRIMARY KEY,
            shop_id TEXT NOT NULL,
            reserved_credits INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            actual_credits INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_reservations_shop_status
            ON credit_reservations(shop_id, status);
        CREATE INDEX IF NOT EXISTS idx_reservations_expires
            ON credit_reservations(expires_at);
        "#,
    )?;

    // Append-only usage audit trail
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS usage_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shop_id TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            estimated_credits INTEGER NOT NULL,
            credits_used INTEGER NOT NULL,
            credits_diff INTEGER NOT NULL,
            diff_percentage REAL NOT NULL,
            usage_date TEXT NOT NULL,
            status TEXT NOT NULL,
            content_digest TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_usage_shop_date
            ON usage_records(shop_id, usage_date);
        "#,
    )?;

    Ok(())
}

/// Migrate the schema from an older version
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<(), QuotaError> {
    // v1 is the first released schema; nothing to migrate from yet
    let _ = conn;
    Err(QuotaError::Datastore(format!(
        "no migration path from ledger schema v{}",
        from_version
    )))
}
