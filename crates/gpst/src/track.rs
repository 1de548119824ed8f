//! In-memory track store.
//!
//! A [`Track`] holds time-indexed [`Point`]s and a flat summary table. All
//! writes go through [`Track::upsert_point`] and [`Track::set_metadata`], which
//! validate every field against the registry in [`crate::field`]. Invalid
//! fields are logged and dropped; the rest of the write still applies.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    field::{FieldType, MetaField, PointField, Value, timestamp_str},
    window::SlidingWindows,
};

static EMPTY_POINT: Point = Point::new();

/// One timestamped observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Point {
    fields: BTreeMap<PointField, Value>,
}

impl Point {
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &PointField) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Numeric value of `key`, if present and numeric.
    pub fn get_f64(&self, key: &PointField) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn contains(&self, key: &PointField) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PointField, &Value)> {
        self.fields.iter()
    }
}

/// A recorded activity: points ordered by timestamp plus summary values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: BTreeMap<OffsetDateTime, Point>,
    metadata: BTreeMap<MetaField, Value>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point at exactly `timestamp`, or an empty point.
    pub fn get_point(&self, timestamp: OffsetDateTime) -> &Point {
        self.points.get(&timestamp).unwrap_or(&EMPTY_POINT)
    }

    /// Merges `fields` into the point at `timestamp`, creating it if needed.
    /// Existing fields not named in `fields` are kept.
    pub fn upsert_point<K, I>(&mut self, timestamp: OffsetDateTime, fields: I)
    where
        K: Into<PointField>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let point = self.points.entry(timestamp).or_default();
        for (key, value) in fields {
            let key = key.into();
            let field_type = key.field_type();
            if let Some(value) = validate(&key, field_type, value, Some(timestamp)) {
                point.fields.insert(key, value);
            }
        }
    }

    /// Points in ascending timestamp order.
    pub fn points_iter(&self) -> impl Iterator<Item = (OffsetDateTime, &Point)> {
        self.points.iter().map(|(ts, point)| (*ts, point))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = OffsetDateTime> + '_ {
        self.points.keys().copied()
    }

    /// For every point, the neighbourhood whose `key` values lie within
    /// `size / 2` of the point's own value. See [`SlidingWindows`].
    pub fn sliding_window_iter(&self, key: PointField, size: f64) -> SlidingWindows<'_> {
        SlidingWindows::new(self.points_iter(), key, size)
    }

    pub fn metadata(&self, key: &MetaField) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn metadata_f64(&self, key: &MetaField) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    pub fn metadata_timestamp(&self, key: &MetaField) -> Option<OffsetDateTime> {
        self.metadata.get(key).and_then(Value::as_timestamp)
    }

    pub fn contains_metadata(&self, key: &MetaField) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn metadata_iter(&self) -> impl Iterator<Item = (&MetaField, &Value)> {
        self.metadata.iter()
    }

    /// The summary table, for serialization.
    pub fn summary(&self) -> &BTreeMap<MetaField, Value> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<MetaField>, value: impl Into<Value>) {
        let key = key.into();
        let field_type = key.field_type();
        if let Some(value) = validate(&key, field_type, value.into(), None) {
            self.metadata.insert(key, value);
        }
    }

    pub fn remove_metadata(&mut self, key: &MetaField) -> Option<Value> {
        self.metadata.remove(key)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(name) = self.metadata(&MetaField::Name) {
            parts.push(format!("name=\"{name}\""));
        }
        if let Some(start) = self.metadata(&MetaField::StartTime) {
            parts.push(format!("start_time=\"{start}\""));
        }
        if let Some(end) = self.metadata(&MetaField::EndTime) {
            parts.push(format!("end_time=\"{end}\""));
        }
        parts.push(format!("num_points={}", self.points.len()));

        write!(f, "Track({})", parts.join(", "))
    }
}

fn validate(
    key: &dyn fmt::Display,
    field_type: Option<&FieldType>,
    value: Value,
    timestamp: Option<OffsetDateTime>,
) -> Option<Value> {
    let at = timestamp
        .map(|ts| format!(" at {}", timestamp_str(ts)))
        .unwrap_or_default();

    let Some(field_type) = field_type else {
        warn!("Unknown field '{key}'{at}.");
        return Some(value);
    };

    match field_type.validate(value) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Rejected value for '{key}'{at}: {e}.");
            None
        }
    }
}
