//! Slider persistence: the save pipeline and read lookups.
//!
//! [`SliderRepository::save`] runs these stages in one `BEGIN IMMEDIATE`
//! transaction:
//!
//! 1. [`stamp_timestamps`]
//! 2. insert or update the `sliders` row (store ids via [`prepare_store_ids`])
//! 3. read the slider's persisted banner positions
//! 4. [`RelationSynchronizer::synchronize`] against the desired banners
//!
//! SQLite grants the write lock at `BEGIN IMMEDIATE`, so no other writer can
//! change the slider's relations between the read in stage 3 and the writes
//! in stage 4. Membership notices are buffered and handed to the
//! repository's [`ChangeSink`] only after the commit succeeds.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, warn};

use crate::db::SqliteRelationStore;
use crate::error::StorageError;
use crate::model::{BannerId, DesiredState, PersistedState, Slider, SliderId, coerce_int};
use crate::relation::{
    ChangeSink, NoopSink, RecordingSink, RelationStore, RelationSynchronizer, SyncResult,
};

/// Store id meaning "all store views".
pub const ALL_STORES: i64 = 0;

/// Result of a successful [`SliderRepository::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub slider_id: SliderId,
    pub sync: SyncResult,
}

impl SaveOutcome {
    /// `true` when the save inserted, deleted, or repositioned any banner.
    #[must_use]
    pub const fn is_changed_banner_list(&self) -> bool {
        self.sync.changed
    }

    #[must_use]
    pub fn affected_banner_ids(&self) -> &[BannerId] {
        &self.sync.affected_ids
    }
}

/// Set `updated_at_us`, and `created_at_us` too when the slider is new.
pub const fn stamp_timestamps(slider: &mut Slider, now_us: i64) {
    slider.updated_at_us = now_us;
    if slider.is_new() {
        slider.created_at_us = now_us;
    }
}

/// Collapse to `[ALL_STORES]` when store 0 is present; otherwise drop
/// duplicates, keeping first-seen order.
#[must_use]
pub fn prepare_store_ids(store_ids: &[i64]) -> Vec<i64> {
    if store_ids.contains(&ALL_STORES) {
        return vec![ALL_STORES];
    }
    let mut prepared = Vec::with_capacity(store_ids.len());
    for &id in store_ids {
        if !prepared.contains(&id) {
            prepared.push(id);
        }
    }
    prepared
}

fn join_store_ids(store_ids: &[i64]) -> String {
    store_ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn split_store_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(coerce_int)
        .collect()
}

/// Reads and writes sliders on a borrowed connection.
pub struct SliderRepository<'conn, N = NoopSink> {
    conn: &'conn Connection,
    sink: N,
}

impl<'conn> SliderRepository<'conn, NoopSink> {
    /// Repository whose membership notices are discarded.
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            sink: NoopSink,
        }
    }
}

impl<'conn, N: ChangeSink> SliderRepository<'conn, N> {
    /// Repository that reports membership changes to `sink`.
    pub const fn with_sink(conn: &'conn Connection, sink: N) -> Self {
        Self { conn, sink }
    }

    /// Save `slider` and reconcile its banners with `banners`.
    ///
    /// `banners == None` leaves existing relations untouched. On success
    /// `slider.id` and its timestamps reflect the stored row; on failure the
    /// transaction is rolled back and `slider` is restored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SliderNotFound`] when updating a missing
    /// slider, or [`StorageError::Sqlite`] for any storage failure.
    pub fn save(
        &self,
        slider: &mut Slider,
        banners: Option<&DesiredState>,
    ) -> Result<SaveOutcome, StorageError> {
        self.save_at(slider, banners, Utc::now().timestamp_micros())
    }

    /// [`Self::save`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`Self::save`].
    pub fn save_at(
        &self,
        slider: &mut Slider,
        banners: Option<&DesiredState>,
        now_us: i64,
    ) -> Result<SaveOutcome, StorageError> {
        let snapshot = slider.clone();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let pending = RecordingSink::default();

        let outcome = match save_in_tx(&tx, slider, banners, now_us, &pending) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(slider_id = ?snapshot.id, error = %err, "rolling back slider save");
                *slider = snapshot;
                return Err(err);
            }
        };

        if let Err(err) = tx.commit() {
            *slider = snapshot;
            return Err(err.into());
        }

        pending.forward_to(&self.sink);
        Ok(outcome)
    }

    /// Load one slider, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load(&self, slider_id: SliderId) -> Result<Option<Slider>, StorageError> {
        let slider = self
            .conn
            .query_row(
                "SELECT slider_id, name, store_ids, created_at_us, updated_at_us
                 FROM sliders WHERE slider_id = ?1",
                params![slider_id],
                row_to_slider,
            )
            .optional()?;
        Ok(slider)
    }

    /// All sliders, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list(&self) -> Result<Vec<Slider>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT slider_id, name, store_ids, created_at_us, updated_at_us
             FROM sliders ORDER BY updated_at_us DESC, slider_id ASC",
        )?;
        let sliders = stmt
            .query_map([], row_to_slider)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sliders)
    }

    /// The slider's name, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn slider_name_by_id(&self, slider_id: SliderId) -> Result<Option<String>, StorageError> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM sliders WHERE slider_id = ?1",
                params![slider_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Store ids the slider is assigned to; empty for unknown sliders.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn lookup_store_ids(&self, slider_id: SliderId) -> Result<Vec<i64>, StorageError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT store_ids FROM sliders WHERE slider_id = ?1",
                params![slider_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.as_deref().map(split_store_ids).unwrap_or_default())
    }

    /// Current `banner_id → position` pairs of the slider.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn banner_positions(&self, slider_id: SliderId) -> Result<PersistedState, StorageError> {
        SqliteRelationStore::new(self.conn).load_positions(slider_id)
    }
}

fn save_in_tx(
    tx: &Transaction<'_>,
    slider: &mut Slider,
    banners: Option<&DesiredState>,
    now_us: i64,
    sink: &RecordingSink,
) -> Result<SaveOutcome, StorageError> {
    stamp_timestamps(slider, now_us);
    slider.store_ids = prepare_store_ids(&slider.store_ids);
    let store_ids = join_store_ids(&slider.store_ids);

    let slider_id = if let Some(id) = slider.id {
        let created_at_us: Option<i64> = tx
            .query_row(
                "UPDATE sliders SET name = ?1, store_ids = ?2, updated_at_us = ?3
                 WHERE slider_id = ?4
                 RETURNING created_at_us",
                params![slider.name, store_ids, slider.updated_at_us, id],
                |row| row.get(0),
            )
            .optional()?;
        slider.created_at_us = created_at_us.ok_or(StorageError::SliderNotFound(id))?;
        id
    } else {
        tx.execute(
            "INSERT INTO sliders (name, store_ids, created_at_us, updated_at_us)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                slider.name,
                store_ids,
                slider.created_at_us,
                slider.updated_at_us
            ],
        )?;
        tx.last_insert_rowid()
    };
    slider.id = Some(slider_id);
    debug!(slider_id, "slider row saved");

    let sync = RelationSynchronizer::new(SqliteRelationStore::new(tx), sink);
    let persisted = if banners.is_some() {
        sync.load_persisted_state(slider_id)?
    } else {
        PersistedState::new()
    };
    let result = sync.synchronize(slider_id, &persisted, banners)?;

    Ok(SaveOutcome {
        slider_id,
        sync: result,
    })
}

fn row_to_slider(row: &rusqlite::Row<'_>) -> rusqlite::Result<Slider> {
    let store_ids: String = row.get(2)?;
    Ok(Slider {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        store_ids: split_store_ids(&store_ids),
        created_at_us: row.get(3)?,
        updated_at_us: row.get(4)?,
    })
}
