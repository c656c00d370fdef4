//! SQLite slider store utilities.
//!
//! Connections are opened with:
//! - `foreign_keys = ON` so relation rows cascade with their slider
//! - `journal_mode = WAL` so readers are not blocked by a saving writer
//! - a busy timeout taken from [`StoreConfig`]

pub mod migrations;
pub mod relation_store;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::config::StoreConfig;

pub use relation_store::SqliteRelationStore;

/// Open (or create) the slider database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path, config: &StoreConfig) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create slider db directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open slider database {}", path.display()))?;

    configure_connection(&conn, config).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply slider store migrations")?;

    Ok(conn)
}

/// Open an existing slider database without creating it.
///
/// Returns `Ok(None)` when the file does not exist or has never been
/// migrated, so callers can point the operator at `slider init`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or configured.
pub fn try_open_store(path: &Path, config: &StoreConfig) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("open slider database {}", path.display()))?;
    configure_connection(&conn, config).context("configure sqlite pragmas")?;

    if migrations::current_schema_version(&conn)? < migrations::LATEST_SCHEMA_VERSION {
        tracing::debug!(path = %path.display(), "slider store is not migrated");
        return Ok(None);
    }

    Ok(Some(conn))
}

fn configure_connection(conn: &Connection, config: &StoreConfig) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(config.busy_timeout())?;
    Ok(())
}
