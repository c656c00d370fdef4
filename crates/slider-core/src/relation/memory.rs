//! In-memory [`RelationStore`] that logs every write.
//!
//! Useful for previews and for asserting the exact write sequence a
//! synchronization produced. Inserting an existing pair overwrites it.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::RelationStore;
use crate::error::StorageError;
use crate::model::{BannerId, PersistedState, Relation, SliderId};

/// A write observed by [`MemoryRelationStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Delete {
        slider_id: SliderId,
        banner_ids: Vec<BannerId>,
    },
    Insert(Vec<Relation>),
    Update(Relation),
}

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<(SliderId, BannerId), i64>,
    ops: Vec<StoreOp>,
}

#[derive(Debug, Default)]
pub struct MemoryRelationStore {
    inner: Mutex<Inner>,
}

impl MemoryRelationStore {
    /// Seed the store with `(slider_id, banner_id, position)` rows.
    #[must_use]
    pub fn with_rows(rows: &[(SliderId, BannerId, i64)]) -> Self {
        let store = Self::default();
        {
            let mut inner = store.lock();
            for &(slider_id, banner_id, position) in rows {
                inner.rows.insert((slider_id, banner_id), position);
            }
        }
        store
    }

    /// Writes applied since construction, oldest first.
    #[must_use]
    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    /// Current rows of `slider_id` (does not count as an op).
    #[must_use]
    pub fn positions(&self, slider_id: SliderId) -> PersistedState {
        positions_of(&self.lock(), slider_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn positions_of(inner: &Inner, slider_id: SliderId) -> PersistedState {
    inner
        .rows
        .range((slider_id, BannerId::MIN)..=(slider_id, BannerId::MAX))
        .map(|(&(_, banner_id), &position)| (banner_id, position))
        .collect()
}

impl RelationStore for MemoryRelationStore {
    fn load_positions(&self, slider_id: SliderId) -> Result<PersistedState, StorageError> {
        Ok(positions_of(&self.lock(), slider_id))
    }

    fn delete_relations(
        &self,
        slider_id: SliderId,
        banner_ids: &[BannerId],
    ) -> Result<usize, StorageError> {
        let mut inner = self.lock();
        let removed = banner_ids
            .iter()
            .filter(|&&banner_id| inner.rows.remove(&(slider_id, banner_id)).is_some())
            .count();
        inner.ops.push(StoreOp::Delete {
            slider_id,
            banner_ids: banner_ids.to_vec(),
        });
        Ok(removed)
    }

    fn insert_relations(&self, rows: &[Relation]) -> Result<usize, StorageError> {
        let mut inner = self.lock();
        for row in rows {
            inner
                .rows
                .insert((row.slider_id, row.banner_id), row.position);
        }
        inner.ops.push(StoreOp::Insert(rows.to_vec()));
        Ok(rows.len())
    }

    fn update_position(
        &self,
        slider_id: SliderId,
        banner_id: BannerId,
        position: i64,
    ) -> Result<usize, StorageError> {
        let mut inner = self.lock();
        let updated = match inner.rows.get_mut(&(slider_id, banner_id)) {
            Some(current) => {
                *current = position;
                1
            }
            None => 0,
        };
        inner.ops.push(StoreOp::Update(Relation {
            slider_id,
            banner_id,
            position,
        }));
        Ok(updated)
    }
}
