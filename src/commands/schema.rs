use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;

use crate::batch::repository::ensure_step_execution_schema;
use crate::util::{ensure_directory, rfc3339};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

pub fn open_database(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS customer (
              customer_id INTEGER PRIMARY KEY,
              first_name TEXT,
              middle_name TEXT,
              last_name TEXT,
              address1 TEXT,
              address2 TEXT,
              city TEXT,
              state TEXT,
              postal_code TEXT,
              email_address TEXT,
              home_phone TEXT,
              cell_phone TEXT,
              work_phone TEXT,
              notification_pref TEXT
            );

            CREATE TABLE IF NOT EXISTS country (
              code TEXT PRIMARY KEY,
              common_name TEXT,
              official_name TEXT,
              flag_emoji TEXT,
              flag_img TEXT,
              region TEXT,
              population INTEGER NOT NULL DEFAULT 0,
              google_map_url TEXT
            );

            CREATE TABLE IF NOT EXISTS country_capital (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              capital TEXT NOT NULL,
              country_code TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_country_capital_code ON country_capital(country_code);
            ",
        )
        .context("failed to initialize job tables")?;

    ensure_step_execution_schema(connection)?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [rfc3339(Utc::now())],
    )?;

    Ok(())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to run count query: {sql}"))
}
