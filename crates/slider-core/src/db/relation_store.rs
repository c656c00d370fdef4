//! [`RelationStore`] backed by the `slider_banners` table.
//!
//! The store never opens its own transaction; every call runs inside
//! whatever transaction the borrowed connection is in.

use rusqlite::{Connection, params, params_from_iter};

use crate::error::StorageError;
use crate::model::{BannerId, PersistedState, Relation, SliderId};
use crate::relation::RelationStore;

/// Banner ids bound per `DELETE ... IN (...)` statement.
const DELETE_CHUNK: usize = 500;

pub struct SqliteRelationStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationStore<'conn> {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Sliders that currently show `banner_id`, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn slider_ids_for_banner(&self, banner_id: BannerId) -> Result<Vec<SliderId>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT slider_id FROM slider_banners WHERE banner_id = ?1 ORDER BY slider_id",
        )?;
        let ids = stmt
            .query_map(params![banner_id], |row| row.get::<_, SliderId>(0))?
            .collect::<Result<Vec<SliderId>, _>>()?;
        Ok(ids)
    }
}

impl RelationStore for SqliteRelationStore<'_> {
    fn load_positions(&self, slider_id: SliderId) -> Result<PersistedState, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT banner_id, position FROM slider_banners WHERE slider_id = ?1")?;
        let positions = stmt
            .query_map(params![slider_id], |row| {
                Ok((row.get::<_, BannerId>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<PersistedState, _>>()?;
        Ok(positions)
    }

    fn delete_relations(
        &self,
        slider_id: SliderId,
        banner_ids: &[BannerId],
    ) -> Result<usize, StorageError> {
        let mut removed = 0;
        for chunk in banner_ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "DELETE FROM slider_banners WHERE slider_id = ? AND banner_id IN ({placeholders})"
            );
            let values = std::iter::once(slider_id).chain(chunk.iter().copied());
            removed += self.conn.execute(&sql, params_from_iter(values))?;
        }
        Ok(removed)
    }

    fn insert_relations(&self, rows: &[Relation]) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO slider_banners (slider_id, banner_id, position) VALUES (?1, ?2, ?3)",
        )?;
        let mut inserted = 0;
        for row in rows {
            inserted += stmt.execute(params![row.slider_id, row.banner_id, row.position])?;
        }
        Ok(inserted)
    }

    fn update_position(
        &self,
        slider_id: SliderId,
        banner_id: BannerId,
        position: i64,
    ) -> Result<usize, StorageError> {
        let updated = self.conn.execute(
            "UPDATE slider_banners SET position = ?1 WHERE slider_id = ?2 AND banner_id = ?3",
            params![position, slider_id, banner_id],
        )?;
        Ok(updated)
    }
}
