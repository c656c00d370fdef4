//! Membership-change notifications.
//!
//! A [`ChangeSink`] hears `(slider_id, banner_ids)` whenever banners join or
//! leave a slider. Delivery is fire-and-forget: sinks return nothing and must
//! not fail the save that triggered them.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::info;

use crate::model::{BannerId, SliderId};

/// Receiver for "slider banner membership changed" notices.
pub trait ChangeSink {
    fn banners_changed(&self, slider_id: SliderId, banner_ids: &[BannerId]);
}

impl<T: ChangeSink + ?Sized> ChangeSink for &T {
    fn banners_changed(&self, slider_id: SliderId, banner_ids: &[BannerId]) {
        (**self).banners_changed(slider_id, banner_ids);
    }
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ChangeSink for NoopSink {
    fn banners_changed(&self, _slider_id: SliderId, _banner_ids: &[BannerId]) {}
}

/// Emits each notice as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ChangeSink for TracingSink {
    fn banners_changed(&self, slider_id: SliderId, banner_ids: &[BannerId]) {
        info!(slider_id, banner_ids = ?banner_ids, "slider banner membership changed");
    }
}

/// One delivered notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNotice {
    pub slider_id: SliderId,
    pub banner_ids: Vec<BannerId>,
}

/// Buffers notices so they can be inspected or forwarded later.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<ChangeNotice>>,
}

impl RecordingSink {
    /// Snapshot of the notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<ChangeNotice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every buffered notice.
    pub fn drain(&self) -> Vec<ChangeNotice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Send every buffered notice on to `sink`, emptying the buffer.
    pub fn forward_to<N: ChangeSink + ?Sized>(&self, sink: &N) {
        for notice in self.drain() {
            sink.banners_changed(notice.slider_id, &notice.banner_ids);
        }
    }
}

impl ChangeSink for RecordingSink {
    fn banners_changed(&self, slider_id: SliderId, banner_ids: &[BannerId]) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ChangeNotice {
                slider_id,
                banner_ids: banner_ids.to_vec(),
            });
    }
}
