//! Derived metrics.
//!
//! [`calculate_additional_data`] runs a fixed sequence of passes over a
//! [`Track`], each a full ordered traversal of its points. Later passes read
//! fields written by earlier ones (speed needs distance, grade needs the
//! smoothed elevation), so the order matters.
//!
//! Passes only add data. Plain fields such as `distance` or `speed` are filled
//! in when the recording lacks them; their `track_` counterparts always hold
//! the value computed here and are rewritten on every run.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use geo::{BoundingRect as _, Distance as _, Haversine, MultiPoint};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, trace};

use crate::{
    field::{MetaField, PointField, Value, timestamp_str},
    track::{Point, Track},
};

/// Window sizes used by the windowed passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorConfig {
    /// Time span, in seconds, averaged into `smooth_elevation`.
    pub smooth_elevation_window: f64,
    /// Distance span, in meters, over which grade is measured.
    pub max_grade_window: f64,
    /// Grade is not computed within half this distance of a window edge.
    pub min_grade_window: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            smooth_elevation_window: 5.0,
            max_grade_window: 50.0,
            min_grade_window: 20.0,
        }
    }
}

const POWER_AVERAGES: [(PointField, i64); 3] = [
    (PointField::Power3s, 3),
    (PointField::Power10s, 10),
    (PointField::Power30s, 30),
];
const POWER_RETENTION: Duration = Duration::seconds(30);

const JUMP_FIELDS: [PointField; 5] = [
    PointField::JumpDistance,
    PointField::JumpHeight,
    PointField::JumpRotations,
    PointField::JumpHangTime,
    PointField::JumpScore,
];

/// Runs every pass with the default configuration.
pub fn calculate_additional_data(track: &mut Track) {
    calculate_additional_data_with(track, &CalculatorConfig::default());
}

pub fn calculate_additional_data_with(track: &mut Track, config: &CalculatorConfig) {
    calculate_times(track); // metadata: start_time, end_time, total_elapsed_time; fields: time
    calculate_bounds(track); // metadata: minlat, minlon, maxlat, maxlon
    calculate_distances(track); // metadata: total_distance, total_track_distance; fields: distance, track_distance
    calculate_speeds(track); // metadata: avg/max_speed, avg/max_track_speed; fields: speed, track_speed
    calculate_vertical_speeds(track); // fields: vertical_speed
    calculate_power_averages(track); // fields: power3s, power10s, power30s
    calculate_smooth_elevation(track, config.smooth_elevation_window); // fields: smooth_elevation
    calculate_grade(track, config.max_grade_window, config.min_grade_window); // metadata: max/min_grade; fields: grade
    calculate_misc(track); // metadata: jump_count
}

fn location(point: &Point) -> Option<geo::Point<f64>> {
    let lat = point.get_f64(&PointField::Latitude)?;
    let lon = point.get_f64(&PointField::Longitude)?;
    Some(geo::Point::new(lon, lat))
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Rate of change between two samples; zero when time does not advance.
fn rate(delta: f64, elapsed: f64) -> f64 {
    if elapsed > 0.0 { delta / elapsed } else { 0.0 }
}

fn calculate_times(track: &mut Track) {
    debug!("Calculating time for track points...");

    let timestamps: Vec<OffsetDateTime> = track.timestamps().collect();
    let start = timestamps.first().copied();
    let end = timestamps.last().copied();

    if let Some(start) = start {
        for ts in timestamps {
            if track.get_point(ts).contains(&PointField::Time) {
                continue;
            }
            let time = (ts - start).as_seconds_f64();
            trace!("Setting time for point at {} to {time} seconds", timestamp_str(ts));
            track.upsert_point(ts, [(PointField::Time, Value::from(time))]);
        }
    }

    if let Some(start) = start
        && !track.contains_metadata(&MetaField::StartTime)
    {
        track.set_metadata(MetaField::StartTime, start);
        info!("Start time set to {}", timestamp_str(start));
    }
    if let Some(end) = end
        && !track.contains_metadata(&MetaField::EndTime)
    {
        track.set_metadata(MetaField::EndTime, end);
        info!("End time set to {}", timestamp_str(end));
    }

    let elapsed = match (
        track.metadata_timestamp(&MetaField::StartTime),
        track.metadata_timestamp(&MetaField::EndTime),
    ) {
        (Some(st), Some(et)) => Some((et - st).as_seconds_f64()),
        _ => None,
    };

    match elapsed {
        Some(elapsed) if elapsed > 0.0 => {
            track.set_metadata(MetaField::TotalElapsedTime, elapsed);
            info!("Total elapsed time set to {elapsed} seconds");
        }
        _ => {
            if track.remove_metadata(&MetaField::TotalElapsedTime).is_some() {
                info!("Total elapsed time removed: start or end time unknown or equal");
            }
        }
    }
}

fn calculate_bounds(track: &mut Track) {
    let bounds = [
        MetaField::MinLat,
        MetaField::MinLon,
        MetaField::MaxLat,
        MetaField::MaxLon,
    ];
    if bounds.iter().all(|key| track.contains_metadata(key)) {
        debug!("Track bounds already present in metadata. Skipping calculation.");
        return;
    }

    debug!("Calculating track bounds...");

    let locations: MultiPoint<f64> = track
        .points_iter()
        .filter_map(|(_, point)| location(point))
        .collect();

    let Some(rect) = locations.bounding_rect() else {
        debug!("Insufficient data to calculate track bounds.");
        return;
    };
    let (min, max) = (rect.min(), rect.max());

    if min.y < max.y && min.x < max.x {
        track.set_metadata(MetaField::MinLat, min.y);
        track.set_metadata(MetaField::MaxLat, max.y);
        track.set_metadata(MetaField::MinLon, min.x);
        track.set_metadata(MetaField::MaxLon, max.x);
        info!(
            "Track bounds set to minlat: {}, minlon: {}, maxlat: {}, maxlon: {}",
            min.y, min.x, max.y, max.x
        );
    } else {
        debug!("Degenerate track bounds. Skipping.");
    }
}

fn calculate_distances(track: &mut Track) {
    debug!("Calculating distances for track points...");

    let timestamps: Vec<OffsetDateTime> = track.timestamps().collect();
    let mut total_distance = 0.0_f64;
    let mut last_location: Option<geo::Point<f64>> = None;

    for ts in timestamps {
        let point = track.get_point(ts);
        let Some(here) = location(point) else {
            continue;
        };

        total_distance += last_location.map_or(0.0, |prev| Haversine.distance(prev, here));
        last_location = Some(here);

        let mut fields = vec![(PointField::TrackDistance, Value::from(total_distance))];
        if !point.contains(&PointField::Distance) {
            fields.push((PointField::Distance, Value::from(total_distance)));
        }
        trace!(
            "Setting track_distance for point at {} to {total_distance} meters",
            timestamp_str(ts)
        );
        track.upsert_point(ts, fields);
    }

    if track.is_empty() {
        debug!("Empty track. Skipping distance totals.");
        return;
    }

    track.set_metadata(MetaField::TotalTrackDistance, total_distance);
    info!("Total track distance set to {total_distance} meters");

    if !track.contains_metadata(&MetaField::TotalDistance) {
        track.set_metadata(MetaField::TotalDistance, total_distance);
        info!("Total distance set to {total_distance} meters");
    }
}

fn calculate_speeds(track: &mut Track) {
    debug!("Calculating speeds for track points...");

    let timestamps: Vec<OffsetDateTime> = track.timestamps().collect();
    let mut last_distance = 0.0_f64;
    let mut last_time = 0.0_f64;
    let mut max_speed = 0.0_f64;
    let mut max_track_speed = 0.0_f64;

    for ts in timestamps {
        let point = track.get_point(ts);
        let (Some(distance), Some(time)) = (
            point.get_f64(&PointField::Distance),
            point.get_f64(&PointField::Time),
        ) else {
            continue;
        };

        let speed = rate(distance - last_distance, time - last_time);
        let mut fields = vec![(PointField::TrackSpeed, Value::from(speed))];
        if !point.contains(&PointField::Speed) {
            fields.push((PointField::Speed, Value::from(speed)));
        }
        trace!("Setting track_speed for point at {} to {speed} m/s", timestamp_str(ts));
        track.upsert_point(ts, fields);

        max_track_speed = max_track_speed.max(speed);
        if let Some(recorded) = track.get_point(ts).get_f64(&PointField::Speed) {
            max_speed = max_speed.max(recorded);
        }

        last_distance = distance;
        last_time = time;
    }

    if !track.is_empty() {
        track.set_metadata(MetaField::MaxTrackSpeed, max_track_speed);
        info!("Max track speed set to {max_track_speed} m/s");

        if !track.contains_metadata(&MetaField::MaxSpeed) {
            track.set_metadata(MetaField::MaxSpeed, max_speed);
            info!("Max speed set to {max_speed} m/s");
        }
    }

    let total_time = track
        .metadata_f64(&MetaField::TotalElapsedTime)
        .filter(|t| *t > 0.0);
    let Some(total_time) = total_time else {
        return;
    };

    if !track.contains_metadata(&MetaField::AvgSpeed)
        && let Some(total_distance) = track.metadata_f64(&MetaField::TotalDistance)
    {
        let avg_speed = total_distance / total_time;
        track.set_metadata(MetaField::AvgSpeed, avg_speed);
        info!("Avg speed set to {avg_speed} m/s");
    }

    if let Some(total_track_distance) = track.metadata_f64(&MetaField::TotalTrackDistance) {
        let avg_track_speed = total_track_distance / total_time;
        track.set_metadata(MetaField::AvgTrackSpeed, avg_track_speed);
        info!("Avg track speed set to {avg_track_speed} m/s");
    }
}

fn calculate_vertical_speeds(track: &mut Track) {
    debug!("Calculating vertical speeds for track points...");

    let timestamps: Vec<OffsetDateTime> = track.timestamps().collect();
    let mut last: Option<(f64, f64)> = None;

    for ts in timestamps {
        let point = track.get_point(ts);
        let (Some(elevation), Some(time)) = (
            point.get_f64(&PointField::Elevation),
            point.get_f64(&PointField::Time),
        ) else {
            continue;
        };
        let has_vertical_speed = point.contains(&PointField::VerticalSpeed);

        if let Some((last_elevation, last_time)) = last
            && !has_vertical_speed
        {
            let v_speed = rate(elevation - last_elevation, time - last_time);
            trace!(
                "Setting vertical_speed for point at {} to {v_speed} m/s",
                timestamp_str(ts)
            );
            track.upsert_point(ts, [(PointField::VerticalSpeed, Value::from(v_speed))]);
        }

        last = Some((elevation, time));
    }
}

fn calculate_power_averages(track: &mut Track) {
    debug!("Calculating power averages for track points...");

    let timestamps: Vec<OffsetDateTime> = track.timestamps().collect();
    let mut retained: BTreeMap<OffsetDateTime, f64> = BTreeMap::new();

    for ts in timestamps {
        let point = track.get_point(ts);
        if let Some(power) = point.get_f64(&PointField::Power) {
            retained.insert(ts, power);
        }

        let fields: Vec<(PointField, Value)> = POWER_AVERAGES
            .into_iter()
            .filter(|(key, _)| !point.contains(key))
            .filter_map(|(key, seconds)| {
                let cutoff = ts - Duration::seconds(seconds);
                let samples = retained.range((Excluded(cutoff), Unbounded)).map(|(_, p)| *p);
                mean(samples).map(|avg| (key, Value::from(avg)))
            })
            .collect();

        if !fields.is_empty() {
            trace!(
                "Setting {} power averages for point at {}",
                fields.len(),
                timestamp_str(ts)
            );
            track.upsert_point(ts, fields);
        }

        let cutoff = ts - POWER_RETENTION;
        let mut kept = retained.split_off(&cutoff);
        kept.remove(&cutoff);
        retained = kept;
    }
}

fn calculate_smooth_elevation(track: &mut Track, window_size: f64) {
    debug!("Calculating smooth elevation for track points...");

    let smoothed: Vec<(OffsetDateTime, f64)> = track
        .sliding_window_iter(PointField::Time, window_size)
        .filter(|(_, point, _)| !point.contains(&PointField::SmoothElevation))
        .filter_map(|(ts, _, window)| {
            let elevations = window
                .iter()
                .filter_map(|p| p.get_f64(&PointField::Elevation));
            mean(elevations).map(|elevation| (ts, elevation))
        })
        .collect();

    for (ts, elevation) in smoothed {
        trace!(
            "Setting smooth_elevation for point at {} to {elevation} meters",
            timestamp_str(ts)
        );
        track.upsert_point(ts, [(PointField::SmoothElevation, Value::from(elevation))]);
    }
}

/// Grade in percent of a chord with length `chord` and rise `rise`.
///
/// The chord is the hypotenuse; the horizontal run is recovered with
/// Pythagoras. Returns `None` when the rise is not shorter than the chord.
pub fn grade_percent(chord: f64, rise: f64) -> Option<f64> {
    let run_squared = chord * chord - rise * rise;
    if !(run_squared > 0.0) {
        return None;
    }
    Some(rise / run_squared.sqrt() * 100.0)
}

fn calculate_grade(track: &mut Track, max_window: f64, min_window: f64) {
    debug!("Calculating grade");

    let edge = min_window / 2.0;
    let mut grades: Vec<(OffsetDateTime, f64, bool)> = Vec::new();

    for (ts, point, window) in track.sliding_window_iter(PointField::Distance, max_window) {
        let (Some(distance), true) = (
            point.get_f64(&PointField::Distance),
            point.contains(&PointField::SmoothElevation),
        ) else {
            trace!(
                "Point at {} missing distance or smooth_elevation for grade calculation. Skipping.",
                timestamp_str(ts)
            );
            continue;
        };

        let mut profile = window.iter().filter_map(|p| {
            Some((
                p.get_f64(&PointField::Distance)?,
                p.get_f64(&PointField::SmoothElevation)?,
            ))
        });
        let Some((z1, y1)) = profile.next() else {
            continue;
        };
        let (z2, y2) = profile.last().unwrap_or((z1, y1));

        // too close to where the window is cut off by the track's start or end
        if distance - z1 < edge || z2 - distance < edge {
            continue;
        }

        match grade_percent(z2 - z1, y2 - y1) {
            Some(grade) => {
                let is_new = !point.contains(&PointField::Grade);
                grades.push((ts, grade, is_new));
            }
            None => debug!(
                "Elevation change exceeds distance at {}. Skipping grade.",
                timestamp_str(ts)
            ),
        }
    }

    let mut max_grade: Option<f64> = None;
    let mut min_grade: Option<f64> = None;

    for (ts, grade, is_new) in grades {
        if is_new {
            trace!("Setting grade for point at {} to {grade} %", timestamp_str(ts));
            track.upsert_point(ts, [(PointField::Grade, Value::from(grade))]);
        }
        max_grade = Some(max_grade.map_or(grade, |g| g.max(grade)));
        min_grade = Some(min_grade.map_or(grade, |g| g.min(grade)));
    }

    if let Some(max_grade) = max_grade {
        track.set_metadata(MetaField::MaxGrade, max_grade);
        info!("Max grade set to {max_grade} %");
    }
    if let Some(min_grade) = min_grade {
        track.set_metadata(MetaField::MinGrade, min_grade);
        info!("Min grade set to {min_grade} %");
    }
}

fn calculate_misc(track: &mut Track) {
    debug!("Calculating miscellaneous metadata...");

    if track.is_empty() {
        return;
    }

    let jump_count = track
        .points_iter()
        .filter(|(ts, point)| {
            let jumped = JUMP_FIELDS.iter().any(|key| point.contains(key));
            if jumped {
                trace!("Jump detected at {}", timestamp_str(*ts));
            }
            jumped
        })
        .count();

    track.set_metadata(MetaField::JumpCount, jump_count);
    info!("Jump count set to {jump_count}");
}
