//! slider-core library.
//!
//! Persists sliders and keeps their banner relations in step with what the
//! admin asked for. The interesting part lives in [`relation`]; [`slider`]
//! wires it into a transactional save, and [`db`] provides the SQLite store.
//!
//! # Conventions
//!
//! - **Errors**: `StorageError` from storage paths, `anyhow::Result` at setup boundaries.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod relation;
pub mod slider;

pub use error::{ErrorCode, StorageError};
pub use model::{BannerId, DesiredState, PersistedState, Relation, Slider, SliderId};
pub use relation::{RelationSynchronizer, SyncResult};
pub use slider::{SaveOutcome, SliderRepository};
