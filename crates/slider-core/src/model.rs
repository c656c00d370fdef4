//! Slider rows, banner relations, and the typed boundary for loosely-typed input.
//!
//! Identifiers and positions arrive from admin forms and JSON payloads as
//! strings, floats, or missing values. They are normalized exactly once, here,
//! with a lossy parse-or-zero policy:
//!
//! - `"12"` → 12, `" -4"` → -4, `"3.9"` → 3, `"12abc"` → 12
//! - `"abc"`, `""`, `null` → 0
//!
//! Callers that need strict validation must validate before building a
//! [`DesiredState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

/// Primary key of a slider row.
pub type SliderId = i64;

/// Identifier of a banner owned by the banner module.
pub type BannerId = i64;

/// Current banner set of one slider as read from storage: banner → position.
pub type PersistedState = BTreeMap<BannerId, i64>;

/// One row of the slider ↔ banner join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub slider_id: SliderId,
    pub banner_id: BannerId,
    pub position: i64,
}

/// Per-banner settings carried by a desired assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSettings {
    pub position: i64,
}

/// The full target banner set for one slider.
///
/// `Option<DesiredState>` distinguishes "leave the relation list alone"
/// (`None`) from "the slider should have no banners" (an empty state).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredState(BTreeMap<BannerId, BannerSettings>);

impl DesiredState {
    /// An empty desired set: every existing relation is to be removed.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Set (or replace) the position of `banner_id`.
    pub fn insert(&mut self, banner_id: BannerId, position: i64) {
        self.0.insert(banner_id, BannerSettings { position });
    }

    #[must_use]
    pub fn get(&self, banner_id: BannerId) -> Option<&BannerSettings> {
        self.0.get(&banner_id)
    }

    #[must_use]
    pub fn contains(&self, banner_id: BannerId) -> bool {
        self.0.contains_key(&banner_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(banner_id, settings)` in ascending banner order.
    pub fn iter(&self) -> impl Iterator<Item = (BannerId, &BannerSettings)> {
        self.0.iter().map(|(id, settings)| (*id, settings))
    }

    /// Flatten into the same shape as a [`PersistedState`].
    #[must_use]
    pub fn positions(&self) -> PersistedState {
        self.0
            .iter()
            .map(|(id, settings)| (*id, settings.position))
            .collect()
    }

    /// Build a desired set from a JSON object such as
    /// `{"5": {"position": "1"}, "6": {"position": 2}}`.
    ///
    /// Keys and positions go through [`coerce_int`] / [`coerce_json`]. A
    /// missing `position` (or a value that is not an object) counts as 0.
    /// Keys that coerce to the same banner id collapse into one entry; the
    /// raw key that sorts last wins.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidDesiredState`] if `value` is not a JSON
    /// object.
    pub fn from_json(value: &Value) -> Result<Self, StorageError> {
        let Value::Object(entries) = value else {
            return Err(StorageError::InvalidDesiredState(format!(
                "expected an object keyed by banner id, got {}",
                json_kind(value)
            )));
        };

        let mut desired = Self::empty();
        for (raw_id, settings) in entries {
            let position = settings.get("position").map_or(0, coerce_json);
            desired.insert(coerce_int(raw_id), position);
        }
        Ok(desired)
    }

    /// Build a desired set from `BANNER[:POSITION]` strings.
    ///
    /// Both halves are coerced; a missing position is 0.
    #[must_use]
    pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> Self {
        let mut desired = Self::empty();
        for pair in pairs {
            let (raw_id, raw_position) = pair
                .as_ref()
                .split_once(':')
                .unwrap_or((pair.as_ref(), ""));
            desired.insert(coerce_int(raw_id), coerce_int(raw_position));
        }
        desired
    }
}

impl FromIterator<(BannerId, i64)> for DesiredState {
    fn from_iter<I: IntoIterator<Item = (BannerId, i64)>>(iter: I) -> Self {
        let mut desired = Self::empty();
        for (banner_id, position) in iter {
            desired.insert(banner_id, position);
        }
        desired
    }
}

/// A slider row. `id == None` means the slider has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slider {
    pub id: Option<SliderId>,
    pub name: String,
    pub store_ids: Vec<i64>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl Slider {
    /// A new, unsaved slider visible in all stores.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            store_ids: vec![0],
            created_at_us: 0,
            updated_at_us: 0,
        }
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Parse-or-zero integer coercion.
///
/// Skips leading whitespace, accepts one optional sign, then consumes the
/// longest run of ASCII digits. Everything after that run is ignored, so
/// `"3.9"` is 3 and `"7px"` is 7. No digits means 0. Values outside `i64`
/// saturate. Exponent notation is not expanded: `"1e3"` is 1.
#[must_use]
pub fn coerce_int(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

/// Integer coercion for JSON values.
///
/// Integers pass through, floats truncate toward zero (saturating), booleans
/// become 0/1, strings use [`coerce_int`], everything else is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_json(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|_| i64::MAX))
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .unwrap_or(0),
        Value::Bool(flag) => i64::from(*flag),
        Value::String(raw) => coerce_int(raw),
        Value::Null | Value::Array(_) | Value::Object(_) => 0,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
