//! GPX 1.1 output.

use std::{fs::File, io::BufWriter, path::Path};

use geo::{Point as GeoPoint, Rect, coord};
use gpx::{Gpx, GpxVersion, Metadata, Track as GpxTrack, TrackSegment, Waypoint};
use tracing::debug;

use crate::{
    errors::WriteError,
    field::{MetaField, PointField},
    file_parsers::FileType,
    track::Track,
};

const CREATOR: &str = concat!("gpst ", env!("CARGO_PKG_VERSION"));

/// Writes `track` to `path`. Only `.gpx` output is supported.
pub fn write_track(track: &Track, path: &Path) -> Result<(), WriteError> {
    if FileType::from_path(path) != Some(FileType::Gpx) {
        return Err(WriteError::UnsupportedFileType(path.display().to_string()));
    }

    let file = File::create(path)?;
    gpx::write(&to_gpx(track), BufWriter::new(file))
        .map_err(|e| WriteError::GpxWriting(e.to_string()))?;

    debug!("Wrote {track} to {}", path.display());
    Ok(())
}

/// Builds a single-track, single-segment GPX document. Points without a
/// position are left out.
pub fn to_gpx(track: &Track) -> Gpx {
    let mut segment = TrackSegment::new();
    for (timestamp, point) in track.points_iter() {
        let (Some(lat), Some(lon)) = (
            point.get_f64(&PointField::Latitude),
            point.get_f64(&PointField::Longitude),
        ) else {
            continue;
        };

        let mut waypoint = Waypoint::new(GeoPoint::new(lon, lat));
        waypoint.elevation = point.get_f64(&PointField::Elevation);
        waypoint.time = Some(timestamp.into());
        segment.points.push(waypoint);
    }

    let name = track
        .metadata(&MetaField::Name)
        .and_then(|v| v.as_str())
        .map(str::to_owned);

    let mut gpx_track = GpxTrack::new();
    gpx_track.name = name.clone();
    gpx_track.type_ = track
        .metadata(&MetaField::Sport)
        .and_then(|v| v.as_str())
        .map(str::to_owned);
    gpx_track.segments.push(segment);

    let metadata = Metadata {
        name,
        time: track.metadata_timestamp(&MetaField::StartTime).map(Into::into),
        bounds: bounds(track),
        ..Default::default()
    };

    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.to_string()),
        metadata: Some(metadata),
        tracks: vec![gpx_track],
        ..Default::default()
    }
}

fn bounds(track: &Track) -> Option<Rect<f64>> {
    let min_lat = track.metadata_f64(&MetaField::MinLat)?;
    let min_lon = track.metadata_f64(&MetaField::MinLon)?;
    let max_lat = track.metadata_f64(&MetaField::MaxLat)?;
    let max_lon = track.metadata_f64(&MetaField::MaxLon)?;

    Some(Rect::new(
        coord! { x: min_lon, y: min_lat },
        coord! { x: max_lon, y: max_lat },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::Value, file_parsers::parse_gpx};
    use time::{Duration, OffsetDateTime, macros::datetime};

    fn ts(seconds: i64) -> OffsetDateTime {
        datetime!(2024-03-10 08:30:00 UTC) + Duration::seconds(seconds)
    }

    fn sample_track() -> Track {
        let mut track = Track::new();
        track.set_metadata(MetaField::Name, "Hill Repeats");
        track.set_metadata(MetaField::StartTime, ts(0));
        track.set_metadata(MetaField::MinLat, 47.0);
        track.set_metadata(MetaField::MinLon, 8.0);
        track.set_metadata(MetaField::MaxLat, 47.01);
        track.set_metadata(MetaField::MaxLon, 8.01);

        track.upsert_point(
            ts(0),
            [
                (PointField::Latitude, Value::from(47.0)),
                (PointField::Longitude, Value::from(8.0)),
                (PointField::Elevation, Value::from(410.0)),
            ],
        );
        track.upsert_point(ts(5), [(PointField::HeartRate, Value::from(120_i64))]);
        track.upsert_point(
            ts(10),
            [
                (PointField::Latitude, Value::from(47.01)),
                (PointField::Longitude, Value::from(8.01)),
            ],
        );
        track
    }

    #[test]
    fn test_to_gpx_skips_points_without_position() {
        let gpx = to_gpx(&sample_track());

        assert_eq!(gpx.version, GpxVersion::Gpx11);
        assert_eq!(gpx.tracks.len(), 1);
        assert_eq!(gpx.tracks[0].segments.len(), 1);
        assert_eq!(gpx.tracks[0].segments[0].points.len(), 2);

        let metadata = gpx.metadata.unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Hill Repeats"));
        assert!(metadata.bounds.is_some());
        assert!(metadata.time.is_some());
    }

    #[test]
    fn test_written_gpx_reads_back() {
        let mut buffer = Vec::new();
        gpx::write(&to_gpx(&sample_track()), &mut buffer).unwrap();

        let track = parse_gpx(&buffer).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.metadata(&MetaField::Name), Some(&Value::from("Hill Repeats")));

        let timestamps: Vec<_> = track.timestamps().collect();
        assert_eq!(timestamps, vec![ts(0), ts(10)]);
        assert_eq!(
            track.get_point(ts(0)).get_f64(&PointField::Elevation),
            Some(410.0)
        );
    }

    #[test]
    fn test_write_track_rejects_other_extensions() {
        let result = write_track(&Track::new(), Path::new("out.fit"));
        assert!(matches!(result, Err(WriteError::UnsupportedFileType(_))));
    }
}
