//! Slider ↔ banner relation reconciliation.
//!
//! A save hands the [`RelationSynchronizer`] the relation set currently in
//! storage ([`PersistedState`]) and the set the caller wants
//! ([`DesiredState`]). The synchronizer computes the smallest diff, writes
//! it through a [`RelationStore`], and reports which banners were touched.
//!
//! # Null vs. empty
//!
//! `None` for the desired state means the caller never touched the banner
//! list, so nothing is written. `Some(DesiredState::empty())` means every
//! relation of the slider is removed.
//!
//! # Apply order
//!
//! Deletes first (one statement scoped to the slider), then a single batched
//! insert, then one update per repositioned banner. Banners whose position
//! is unchanged are never rewritten.
//!
//! # Concurrency
//!
//! The synchronizer does no locking and does not re-read storage. The
//! `persisted` snapshot and the writes must share one transaction that
//! holds the write lock for the slider, otherwise a concurrent save can be
//! overwritten by a stale diff. [`crate::slider::SliderRepository::save`]
//! does this with `BEGIN IMMEDIATE`. A storage error mid-apply leaves a
//! partial write for the caller's transaction to roll back.

pub mod memory;
pub mod notify;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::StorageError;
use crate::model::{BannerId, DesiredState, PersistedState, Relation, SliderId};

pub use memory::{MemoryRelationStore, StoreOp};
pub use notify::{ChangeNotice, ChangeSink, NoopSink, RecordingSink, TracingSink};

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Writes needed to turn a persisted relation set into a desired one.
///
/// All maps are keyed by banner id. `to_delete` carries the position that
/// was persisted; `to_insert` and `to_update` carry the desired position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationDiff {
    pub to_insert: BTreeMap<BannerId, i64>,
    pub to_delete: BTreeMap<BannerId, i64>,
    pub to_update: BTreeMap<BannerId, i64>,
}

impl RelationDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty() && self.to_update.is_empty()
    }

    /// Every banner that gained, lost, or moved: sorted, deduplicated.
    #[must_use]
    pub fn affected_ids(&self) -> Vec<BannerId> {
        let mut ids: Vec<BannerId> = self
            .to_insert
            .keys()
            .chain(self.to_delete.keys())
            .chain(self.to_update.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Banners whose membership changed (inserted or deleted).
    ///
    /// Position-only moves are excluded.
    #[must_use]
    pub fn notify_ids(&self) -> Vec<BannerId> {
        let mut ids: Vec<BannerId> = self
            .to_insert
            .keys()
            .chain(self.to_delete.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Compute the diff between `persisted` and `desired`.
///
/// Pure function; no storage access.
#[must_use]
pub fn diff(persisted: &PersistedState, desired: &DesiredState) -> RelationDiff {
    let mut result = RelationDiff::default();

    for (banner_id, settings) in desired.iter() {
        match persisted.get(&banner_id) {
            None => {
                result.to_insert.insert(banner_id, settings.position);
            }
            Some(&current) if current != settings.position => {
                result.to_update.insert(banner_id, settings.position);
            }
            Some(_) => {}
        }
    }

    for (&banner_id, &position) in persisted {
        if !desired.contains(banner_id) {
            result.to_delete.insert(banner_id, position);
        }
    }

    result
}

// ---------------------------------------------------------------------------
// SyncResult
// ---------------------------------------------------------------------------

/// Outcome of one [`RelationSynchronizer::synchronize`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// `true` iff any insert, delete, or update was applied.
    pub changed: bool,
    /// Banners that were inserted, deleted, or repositioned.
    pub affected_ids: Vec<BannerId>,
    /// Banners whose membership changed; the set sent to the [`ChangeSink`].
    pub notify_ids: Vec<BannerId>,
    /// The applied diff.
    pub diff: RelationDiff,
}

impl SyncResult {
    /// Result for a save that did not touch the banner list.
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    fn from_diff(diff: RelationDiff) -> Self {
        Self {
            changed: !diff.is_empty(),
            affected_ids: diff.affected_ids(),
            notify_ids: diff.notify_ids(),
            diff,
        }
    }
}

// ---------------------------------------------------------------------------
// RelationStore
// ---------------------------------------------------------------------------

/// Storage capability the synchronizer writes through.
///
/// Implementations must keep at most one row per `(slider_id, banner_id)`.
pub trait RelationStore {
    /// Fetch every `banner_id → position` pair for `slider_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn load_positions(&self, slider_id: SliderId) -> Result<PersistedState, StorageError>;

    /// Remove the rows for `banner_ids` under `slider_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_relations(
        &self,
        slider_id: SliderId,
        banner_ids: &[BannerId],
    ) -> Result<usize, StorageError>;

    /// Insert all `rows` as one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if any row cannot be inserted.
    fn insert_relations(&self, rows: &[Relation]) -> Result<usize, StorageError>;

    /// Set the position of the single row `(slider_id, banner_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn update_position(
        &self,
        slider_id: SliderId,
        banner_id: BannerId,
        position: i64,
    ) -> Result<usize, StorageError>;
}

impl<T: RelationStore + ?Sized> RelationStore for &T {
    fn load_positions(&self, slider_id: SliderId) -> Result<PersistedState, StorageError> {
        (**self).load_positions(slider_id)
    }

    fn delete_relations(
        &self,
        slider_id: SliderId,
        banner_ids: &[BannerId],
    ) -> Result<usize, StorageError> {
        (**self).delete_relations(slider_id, banner_ids)
    }

    fn insert_relations(&self, rows: &[Relation]) -> Result<usize, StorageError> {
        (**self).insert_relations(rows)
    }

    fn update_position(
        &self,
        slider_id: SliderId,
        banner_id: BannerId,
        position: i64,
    ) -> Result<usize, StorageError> {
        (**self).update_position(slider_id, banner_id, position)
    }
}

// ---------------------------------------------------------------------------
// RelationSynchronizer
// ---------------------------------------------------------------------------

/// Reconciles a slider's stored banner relations with a desired set.
pub struct RelationSynchronizer<S, N> {
    store: S,
    sink: N,
}

impl<S: RelationStore, N: ChangeSink> RelationSynchronizer<S, N> {
    pub const fn new(store: S, sink: N) -> Self {
        Self { store, sink }
    }

    /// Read the current relation set for `slider_id`.
    ///
    /// Pass the result unmodified to [`Self::synchronize`] within the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn load_persisted_state(&self, slider_id: SliderId) -> Result<PersistedState, StorageError> {
        self.store.load_positions(slider_id)
    }

    /// Apply the diff between `persisted` and `desired` for `slider_id`.
    ///
    /// `desired == None` is a no-op. The sink hears about membership
    /// changes only after every write succeeded.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure; earlier phases may already have
    /// been written.
    pub fn synchronize(
        &self,
        slider_id: SliderId,
        persisted: &PersistedState,
        desired: Option<&DesiredState>,
    ) -> Result<SyncResult, StorageError> {
        let Some(desired) = desired else {
            trace!(slider_id, "banner list untouched; skipping relation sync");
            return Ok(SyncResult::unchanged());
        };

        let diff = diff(persisted, desired);
        if diff.is_empty() {
            trace!(slider_id, "banner relations already match");
            return Ok(SyncResult::from_diff(diff));
        }

        debug!(
            slider_id,
            inserts = diff.to_insert.len(),
            deletes = diff.to_delete.len(),
            updates = diff.to_update.len(),
            "applying banner relation diff"
        );

        if !diff.to_delete.is_empty() {
            let banner_ids: Vec<BannerId> = diff.to_delete.keys().copied().collect();
            self.store.delete_relations(slider_id, &banner_ids)?;
        }

        if !diff.to_insert.is_empty() {
            let rows: Vec<Relation> = diff
                .to_insert
                .iter()
                .map(|(&banner_id, &position)| Relation {
                    slider_id,
                    banner_id,
                    position,
                })
                .collect();
            self.store.insert_relations(&rows)?;
        }

        for (&banner_id, &position) in &diff.to_update {
            self.store.update_position(slider_id, banner_id, position)?;
        }

        let result = SyncResult::from_diff(diff);
        if !result.notify_ids.is_empty() {
            self.sink.banners_changed(slider_id, &result.notify_ids);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted(pairs: &[(BannerId, i64)]) -> PersistedState {
        pairs.iter().copied().collect()
    }

    fn desired(pairs: &[(BannerId, i64)]) -> DesiredState {
        pairs.iter().copied().collect()
    }

    #[test]
    fn diff_splits_insert_delete_update() {
        let d = diff(
            &persisted(&[(1, 1), (2, 2), (3, 3)]),
            &desired(&[(2, 9), (4, 1)]),
        );
        assert_eq!(d.to_delete, BTreeMap::from([(1, 1), (3, 3)]));
        assert_eq!(d.to_insert, BTreeMap::from([(4, 1)]));
        assert_eq!(d.to_update, BTreeMap::from([(2, 9)]));
        assert_eq!(d.affected_ids(), vec![1, 2, 3, 4]);
        assert_eq!(d.notify_ids(), vec![1, 3, 4]);
    }

    #[test]
    fn diff_skips_unchanged_positions() {
        let d = diff(&persisted(&[(5, 1)]), &desired(&[(5, 1)]));
        assert!(d.is_empty());
        assert!(d.affected_ids().is_empty());
    }

    #[test]
    fn diff_of_empty_against_empty_is_empty() {
        assert!(diff(&PersistedState::new(), &DesiredState::empty()).is_empty());
    }

    #[test]
    fn none_desired_writes_nothing() {
        let store = MemoryRelationStore::with_rows(&[(7, 5, 1), (7, 6, 2)]);
        let sink = RecordingSink::default();
        let sync = RelationSynchronizer::new(&store, &sink);

        let before = sync.load_persisted_state(7).expect("load");
        let result = sync.synchronize(7, &before, None).expect("sync");

        assert_eq!(result, SyncResult::unchanged());
        assert!(!result.changed);
        assert!(store.ops().is_empty());
        assert!(sink.notices().is_empty());
        assert_eq!(store.positions(7), before);
    }

    #[test]
    fn writes_follow_delete_insert_update_order() {
        let store = MemoryRelationStore::with_rows(&[(3, 1, 1), (3, 2, 2), (3, 3, 3)]);
        let sync = RelationSynchronizer::new(&store, NoopSink);

        let before = sync.load_persisted_state(3).expect("load");
        sync.synchronize(3, &before, Some(&desired(&[(2, 9), (4, 1), (5, 0)])))
            .expect("sync");

        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Delete {
                    slider_id: 3,
                    banner_ids: vec![1, 3],
                },
                StoreOp::Insert(vec![
                    Relation {
                        slider_id: 3,
                        banner_id: 4,
                        position: 1,
                    },
                    Relation {
                        slider_id: 3,
                        banner_id: 5,
                        position: 0,
                    },
                ]),
                StoreOp::Update(Relation {
                    slider_id: 3,
                    banner_id: 2,
                    position: 9,
                }),
            ]
        );
        assert_eq!(store.positions(3), persisted(&[(2, 9), (4, 1), (5, 0)]));
    }

    #[test]
    fn position_move_does_not_notify() {
        let store = MemoryRelationStore::with_rows(&[(1, 5, 1)]);
        let sink = RecordingSink::default();
        let sync = RelationSynchronizer::new(&store, &sink);

        let result = sync
            .synchronize(1, &persisted(&[(5, 1)]), Some(&desired(&[(5, 2)])))
            .expect("sync");

        assert!(result.changed);
        assert_eq!(result.affected_ids, vec![5]);
        assert!(result.notify_ids.is_empty());
        assert!(sink.notices().is_empty());
    }

    #[test]
    fn membership_change_notifies_once() {
        let store = MemoryRelationStore::default();
        let sink = RecordingSink::default();
        let sync = RelationSynchronizer::new(&store, &sink);

        sync.synchronize(9, &PersistedState::new(), Some(&desired(&[(5, 1), (6, 2)])))
            .expect("sync");

        assert_eq!(
            sink.notices(),
            vec![ChangeNotice {
                slider_id: 9,
                banner_ids: vec![5, 6],
            }]
        );
    }

    #[test]
    fn relations_of_other_sliders_are_untouched() {
        let store = MemoryRelationStore::with_rows(&[(1, 5, 1), (2, 5, 7)]);
        let sync = RelationSynchronizer::new(&store, NoopSink);

        sync.synchronize(1, &persisted(&[(5, 1)]), Some(&DesiredState::empty()))
            .expect("sync");

        assert!(store.positions(1).is_empty());
        assert_eq!(store.positions(2), persisted(&[(5, 7)]));
    }
}
