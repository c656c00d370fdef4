//! SQLite schema migrations for the slider store.

use super::schema;
use chrono::Utc;
use rusqlite::{Connection, params, types::Type};
use tracing::debug;

/// Schema version a fully migrated store reports.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

const MIGRATIONS: &[(u32, &str)] = &[(1, schema::MIGRATION_V1_SQL), (2, schema::MIGRATION_V2_SQL)];

/// The store's `user_version`; 0 for a file that was never migrated.
///
/// # Errors
///
/// Fails if the pragma cannot be read or holds a negative or oversized value.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err)))
}

/// Bring the store up to [`LATEST_SCHEMA_VERSION`].
///
/// Every pending step runs in its own transaction that executes the DDL,
/// appends a `schema_history` row, and bumps `user_version`. A store that is
/// already current is left untouched. Returns the resulting version.
///
/// # Errors
///
/// Fails on the first step that cannot be applied; earlier steps stay
/// committed.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let from = current_schema_version(conn)?;
    let pending = MIGRATIONS.iter().filter(|(version, _)| *version > from);

    let mut reached = from;
    for &(version, ddl) in pending {
        let tx = conn.transaction()?;
        tx.execute_batch(ddl)?;
        tx.execute(
            "INSERT OR REPLACE INTO schema_history (version, applied_at_us) VALUES (?1, ?2)",
            params![version, Utc::now().timestamp_micros()],
        )?;
        tx.pragma_update(None, "user_version", i64::from(version))?;
        tx.commit()?;

        debug!(from = reached, to = version, "slider store migrated");
        reached = version;
    }

    Ok(reached)
}

#[cfg(test)]
mod tests {
    use super::{LATEST_SCHEMA_VERSION, current_schema_version, migrate};
    use crate::db::schema;
    use rusqlite::{Connection, params};

    fn sqlite_object_exists(
        conn: &Connection,
        object_type: &str,
        object_name: &str,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            )",
            params![object_type, object_name],
            |row| row.get(0),
        )
    }

    #[test]
    fn migrate_empty_db_to_latest() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION);

        assert!(sqlite_object_exists(&conn, "table", "sliders")?);
        assert!(sqlite_object_exists(&conn, "table", "slider_banners")?);
        assert!(sqlite_object_exists(&conn, "table", "schema_history")?);

        for index in schema::REQUIRED_INDEXES {
            assert!(
                sqlite_object_exists(&conn, "index", index)?,
                "missing expected index {index}"
            );
        }

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let history: Vec<u32> = conn
            .prepare("SELECT version FROM schema_history ORDER BY version")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        assert_eq!(history, vec![1, LATEST_SCHEMA_VERSION]);

        Ok(())
    }

    #[test]
    fn migrate_upgrades_from_v1_keeping_rows() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        conn.execute_batch(schema::MIGRATION_V1_SQL)?;
        conn.pragma_update(None, "user_version", 1_i64)?;
        conn.execute(
            "INSERT INTO sliders (slider_id, name, store_ids, created_at_us, updated_at_us)
             VALUES (1, 'Homepage', '0', 1, 2)",
            [],
        )?;
        conn.execute(
            "INSERT INTO slider_banners (slider_id, banner_id, position) VALUES (1, 5, 1)",
            [],
        )?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert!(sqlite_object_exists(&conn, "index", "idx_slider_banners_banner")?);

        let upgraded: Vec<u32> = conn
            .prepare("SELECT version FROM schema_history ORDER BY version")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        assert_eq!(upgraded, vec![2], "only the pending step is recorded");

        let position: i64 = conn.query_row(
            "SELECT position FROM slider_banners WHERE slider_id = 1 AND banner_id = 5",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(position, 1);

        Ok(())
    }
}
