//! Activity file readers for GPX and FIT formats.
//!
//! Both readers fill a [`Track`] through its validated write operations, so
//! out-of-range or mistyped sensor values are dropped with a warning rather
//! than failing the whole file.

use std::path::Path;

use fitparser::{FitDataRecord, profile::MesgNum};
use time::OffsetDateTime;
use tracing::{debug, trace};

use crate::{
    errors::ReadError,
    field::{MetaField, PointField, Value},
    track::Track,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Gpx,
    Fit,
}

impl FileType {
    /// Detects the type from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gpx" => Some(FileType::Gpx),
            "fit" => Some(FileType::Fit),
            _ => None,
        }
    }
}

/// Reads a `.gpx` or `.fit` file into a track.
pub fn read_track(path: &Path) -> Result<Track, ReadError> {
    let file_type = FileType::from_path(path)
        .ok_or_else(|| ReadError::UnsupportedFileType(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;

    match file_type {
        FileType::Gpx => parse_gpx(&bytes),
        FileType::Fit => parse_fit(&bytes),
    }
}

/// Parses GPX track points. Waypoints without a time cannot be indexed and
/// are skipped.
pub fn parse_gpx(bytes: &[u8]) -> Result<Track, ReadError> {
    let gpx = gpx::read(bytes).map_err(|e| ReadError::GpxParsing(e.to_string()))?;
    let mut track = Track::new();

    if let Some(name) = gpx.metadata.as_ref().and_then(|m| m.name.clone()) {
        track.set_metadata(MetaField::Name, name);
    }

    for trk in &gpx.tracks {
        if let Some(name) = &trk.name
            && !track.contains_metadata(&MetaField::Name)
        {
            track.set_metadata(MetaField::Name, name.as_str());
        }
        if let Some(kind) = &trk.type_
            && !track.contains_metadata(&MetaField::Sport)
        {
            track.set_metadata(MetaField::Sport, kind.as_str());
        }

        for seg in &trk.segments {
            for pt in &seg.points {
                let Some(time) = pt.time else {
                    debug!("Skipping GPX point without time");
                    continue;
                };
                let timestamp: OffsetDateTime = time.into();

                let mut fields = vec![
                    (PointField::Timestamp, Value::from(timestamp)),
                    (PointField::Latitude, Value::from(pt.point().y())),
                    (PointField::Longitude, Value::from(pt.point().x())),
                ];
                if let Some(elevation) = pt.elevation {
                    fields.push((PointField::Elevation, Value::from(elevation)));
                }
                if let Some(speed) = pt.speed {
                    fields.push((PointField::Speed, Value::from(speed)));
                }
                track.upsert_point(timestamp, fields);
            }
        }
    }

    debug!("Read {track} from GPX");
    Ok(track)
}

/// Parses FIT `record`, `session`, `sport` and `jump` messages.
pub fn parse_fit(bytes: &[u8]) -> Result<Track, ReadError> {
    let records = fitparser::from_bytes(bytes).map_err(|e| ReadError::FitParsing(e.to_string()))?;
    let mut track = Track::new();

    for record in &records {
        match record.kind() {
            MesgNum::Record => read_fit_record(&mut track, record),
            MesgNum::Session => read_fit_session(&mut track, record),
            MesgNum::Sport => read_fit_sport(&mut track, record),
            MesgNum::Jump => read_fit_jump(&mut track, record),
            _ => {}
        }
    }

    debug!("Read {track} from FIT");
    Ok(track)
}

fn read_fit_record(track: &mut Track, record: &FitDataRecord) {
    let mut timestamp = None;
    let mut fields = Vec::new();
    let mut altitude = None;
    let mut enhanced_altitude = None;
    let mut speed = None;
    let mut enhanced_speed = None;

    for field in record.fields() {
        let value = field.value();
        match field.name() {
            "timestamp" => timestamp = fit_timestamp(value),
            "position_lat" => {
                if let Some(lat) = fit_semicircles(value) {
                    fields.push((PointField::Latitude, Value::from(lat)));
                }
            }
            "position_long" => {
                if let Some(lon) = fit_semicircles(value) {
                    fields.push((PointField::Longitude, Value::from(lon)));
                }
            }
            "altitude" => altitude = fit_f64(value),
            "enhanced_altitude" => enhanced_altitude = fit_f64(value),
            "speed" => speed = fit_f64(value),
            "enhanced_speed" => enhanced_speed = fit_f64(value),
            name => {
                let key = PointField::from(name);
                if let PointField::Other(_) = key {
                    trace!("Ignoring unregistered FIT record field '{name}'");
                    continue;
                }
                if let Some(value) = fit_value(value) {
                    fields.push((key, value));
                }
            }
        }
    }

    let Some(timestamp) = timestamp else {
        debug!("Skipping FIT record without timestamp");
        return;
    };

    if let Some(elevation) = enhanced_altitude.or(altitude) {
        fields.push((PointField::Elevation, Value::from(elevation)));
    }
    if let Some(speed) = enhanced_speed.or(speed) {
        fields.push((PointField::Speed, Value::from(speed)));
    }
    fields.push((PointField::Timestamp, Value::from(timestamp)));

    track.upsert_point(timestamp, fields);
}

fn read_fit_session(track: &mut Track, record: &FitDataRecord) {
    for field in record.fields() {
        let value = field.value();
        let (key, value) = match field.name() {
            // session timestamp marks when the summary was written, not the end
            "timestamp" => continue,
            "start_position_lat" => (MetaField::StartPositionLat, fit_semicircles(value).map(Value::from)),
            "start_position_long" => (MetaField::StartPositionLong, fit_semicircles(value).map(Value::from)),
            "end_position_lat" => (MetaField::EndPositionLat, fit_semicircles(value).map(Value::from)),
            "end_position_long" => (MetaField::EndPositionLong, fit_semicircles(value).map(Value::from)),
            "nec_lat" => (MetaField::MaxLat, fit_semicircles(value).map(Value::from)),
            "nec_long" => (MetaField::MaxLon, fit_semicircles(value).map(Value::from)),
            "swc_lat" => (MetaField::MinLat, fit_semicircles(value).map(Value::from)),
            "swc_long" => (MetaField::MinLon, fit_semicircles(value).map(Value::from)),
            "enhanced_avg_speed" => (MetaField::AvgSpeed, fit_f64(value).map(Value::from)),
            "enhanced_max_speed" => (MetaField::MaxSpeed, fit_f64(value).map(Value::from)),
            name => {
                let key = MetaField::from(name);
                if let MetaField::Other(_) = key {
                    trace!("Ignoring unregistered FIT session field '{name}'");
                    continue;
                }
                (key, fit_value(value))
            }
        };

        if let Some(value) = value {
            track.set_metadata(key, value);
        }
    }
}

fn read_fit_sport(track: &mut Track, record: &FitDataRecord) {
    for field in record.fields() {
        let key = match field.name() {
            "sport" => MetaField::Sport,
            "sub_sport" => MetaField::SubSport,
            "name" => MetaField::SportProfileName,
            _ => continue,
        };
        if let Some(value) = fit_value(field.value()) {
            track.set_metadata(key, value);
        }
    }
}

fn read_fit_jump(track: &mut Track, record: &FitDataRecord) {
    let mut timestamp = None;
    let mut fields = Vec::new();

    for field in record.fields() {
        let value = field.value();
        let key = match field.name() {
            "timestamp" => {
                timestamp = fit_timestamp(value);
                continue;
            }
            "distance" => PointField::JumpDistance,
            "height" => PointField::JumpHeight,
            "rotations" => PointField::JumpRotations,
            "hang_time" => PointField::JumpHangTime,
            "score" => PointField::JumpScore,
            _ => continue,
        };
        if let Some(value) = fit_value(value) {
            fields.push((key, value));
        }
    }

    match timestamp {
        Some(timestamp) => track.upsert_point(timestamp, fields),
        None => debug!("Skipping FIT jump without timestamp"),
    }
}

/// Converts FIT semicircles to degrees: 2^31 semicircles = 180 degrees.
fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}

fn fit_semicircles(value: &fitparser::Value) -> Option<f64> {
    match value {
        fitparser::Value::SInt32(v) => Some(semicircles_to_degrees(*v)),
        _ => None,
    }
}

fn fit_timestamp(value: &fitparser::Value) -> Option<OffsetDateTime> {
    match value {
        fitparser::Value::Timestamp(t) => chrono_to_offset(t),
        _ => None,
    }
}

fn chrono_to_offset<Tz: chrono::TimeZone>(t: &chrono::DateTime<Tz>) -> Option<OffsetDateTime> {
    let nanos = t.timestamp_nanos_opt()?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos)).ok()
}

fn fit_f64(value: &fitparser::Value) -> Option<f64> {
    fit_value(value).and_then(|v| v.as_f64())
}

/// Maps a decoded FIT value onto a track value. Arrays and invalid values
/// have no counterpart.
fn fit_value(value: &fitparser::Value) -> Option<Value> {
    use fitparser::Value as Fit;

    let value = match value {
        Fit::Timestamp(_) => Value::from(fit_timestamp(value)?),
        Fit::Byte(v) | Fit::Enum(v) | Fit::UInt8(v) | Fit::UInt8z(v) => Value::Int(i64::from(*v)),
        Fit::SInt8(v) => Value::Int(i64::from(*v)),
        Fit::SInt16(v) => Value::Int(i64::from(*v)),
        Fit::UInt16(v) | Fit::UInt16z(v) => Value::Int(i64::from(*v)),
        Fit::SInt32(v) => Value::Int(i64::from(*v)),
        Fit::UInt32(v) | Fit::UInt32z(v) => Value::Int(i64::from(*v)),
        Fit::SInt64(v) => Value::Int(*v),
        Fit::UInt64(v) | Fit::UInt64z(v) => Value::Int(i64::try_from(*v).ok()?),
        Fit::Float32(v) => Value::Float(f64::from(*v)),
        Fit::Float64(v) => Value::Float(*v),
        Fit::String(v) => Value::from(v.as_str()),
        _ => return None,
    };
    Some(value)
}
