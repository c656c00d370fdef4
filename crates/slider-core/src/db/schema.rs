//! SQLite schema for sliders and their banner relations.
//!
//! - `sliders` holds one row per slider; `store_ids` is a comma-separated list
//! - `slider_banners` is the join table, one row per `(slider_id, banner_id)`
//!   with a display `position`; rows cascade when their slider is deleted
//! - `schema_history` gets one row per applied migration

/// Migration v1: slider table, join table, and migration history.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS sliders (
    slider_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    store_ids TEXT NOT NULL DEFAULT '',
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS slider_banners (
    slider_id INTEGER NOT NULL REFERENCES sliders(slider_id) ON DELETE CASCADE,
    banner_id INTEGER NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (slider_id, banner_id)
);

CREATE TABLE IF NOT EXISTS schema_history (
    version INTEGER PRIMARY KEY,
    applied_at_us INTEGER NOT NULL
);
";

/// Migration v2: reverse lookup from a banner to the sliders showing it.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_slider_banners_banner
    ON slider_banners(banner_id, slider_id);

CREATE INDEX IF NOT EXISTS idx_sliders_updated
    ON sliders(updated_at_us DESC);
";

/// Indexes expected by the read paths.
pub const REQUIRED_INDEXES: &[&str] = &["idx_slider_banners_banner", "idx_sliders_updated"];
