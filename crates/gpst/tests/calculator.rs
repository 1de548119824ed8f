use geo::{Distance, Haversine, Point as GeoPoint};
use gpst::{MetaField, PointField, Track, Value, calculate_additional_data};
use time::{Duration, OffsetDateTime, macros::datetime};

fn ts(seconds: i64) -> OffsetDateTime {
    datetime!(2024-07-14 09:00:00 UTC) + Duration::seconds(seconds)
}

fn located(lat: f64, lon: f64) -> Vec<(PointField, Value)> {
    vec![
        (PointField::Latitude, Value::from(lat)),
        (PointField::Longitude, Value::from(lon)),
    ]
}

/// A straight climb along the equator: 5 m of horizontal travel and 0.5 m of
/// ascent every second.
fn steady_climb(seconds: i64) -> Track {
    let step = 5.0 / Haversine.distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
    let mut track = Track::new();
    for i in 0..seconds {
        let mut fields = located(0.0, i as f64 * step);
        fields.push((PointField::Elevation, Value::from(100.0 + 0.5 * i as f64)));
        track.upsert_point(ts(i), fields);
    }
    track
}

#[test]
fn test_calculation_is_idempotent() {
    let mut track = steady_climb(40);
    track.upsert_point(ts(12), [(PointField::Power, Value::from(250_i64))]);
    track.upsert_point(ts(20), [(PointField::JumpHeight, Value::from(0.4))]);

    calculate_additional_data(&mut track);
    let first = track.clone();
    calculate_additional_data(&mut track);

    assert_eq!(track, first);
}

#[test]
fn test_collinear_distance_adds_up() {
    let mut track = Track::new();
    for i in 0..5 {
        track.upsert_point(ts(i * 10), located(0.001 * i as f64, 0.0));
    }

    calculate_additional_data(&mut track);

    let direct = Haversine.distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.004));
    let total = track.metadata_f64(&MetaField::TotalTrackDistance).unwrap();
    assert!((total - direct).abs() < 1e-6 * direct);
    assert_eq!(track.metadata_f64(&MetaField::TotalDistance), Some(total));

    let last = track.get_point(ts(40));
    assert_eq!(last.get_f64(&PointField::TrackDistance), Some(total));
    assert_eq!(last.get_f64(&PointField::Distance), Some(total));

    let avg = track.metadata_f64(&MetaField::AvgTrackSpeed).unwrap();
    assert!((avg - total / 40.0).abs() < 1e-9);
}

#[test]
fn test_steady_climb_grade() {
    let mut track = steady_climb(40);

    calculate_additional_data(&mut track);

    // rise over chord is 0.1 everywhere
    let expected = 0.1 / (1.0_f64 - 0.01).sqrt() * 100.0;
    for i in 10..30 {
        let grade = track
            .get_point(ts(i))
            .get_f64(&PointField::Grade)
            .unwrap_or_else(|| panic!("no grade at {i}s"));
        assert!((grade - expected).abs() < 1e-4, "grade {grade} at {i}s");
    }

    // no grade right at the start where the window is cut off
    assert!(!track.get_point(ts(0)).contains(&PointField::Grade));

    let max_grade = track.metadata_f64(&MetaField::MaxGrade).unwrap();
    let min_grade = track.metadata_f64(&MetaField::MinGrade).unwrap();
    assert!(min_grade <= expected + 1e-4 && expected - 1e-4 <= max_grade);

    let vertical = track
        .get_point(ts(5))
        .get_f64(&PointField::VerticalSpeed)
        .unwrap();
    assert!((vertical - 0.5).abs() < 1e-9);
}

#[test]
fn test_invalid_latitude_excluded_from_distance() {
    let mut track = Track::new();
    track.upsert_point(ts(0), located(45.0, 7.0));
    track.upsert_point(ts(10), located(95.0, 7.0));
    track.upsert_point(ts(20), located(45.001, 7.001));

    calculate_additional_data(&mut track);

    let bad = track.get_point(ts(10));
    assert!(!bad.contains(&PointField::Latitude));
    assert!(!bad.contains(&PointField::Distance));
    assert_eq!(bad.get_f64(&PointField::Longitude), Some(7.0));

    let expected = Haversine.distance(GeoPoint::new(7.0, 45.0), GeoPoint::new(7.001, 45.001));
    let total = track.metadata_f64(&MetaField::TotalTrackDistance).unwrap();
    assert!((total - expected).abs() < 1e-6);
    assert_eq!(track.metadata_f64(&MetaField::MaxLat), Some(45.001));
}

#[test]
fn test_power_window_excludes_cutoff() {
    let mut track = Track::new();
    track.upsert_point(ts(0), [(PointField::Power, Value::from(1000.0))]);
    for i in 1..=40 {
        track.upsert_point(ts(i), [(PointField::Power, Value::from(100.0))]);
    }

    calculate_additional_data(&mut track);

    let power30s = |i: i64| track.get_point(ts(i)).get_f64(&PointField::Power30s).unwrap();
    assert!((power30s(29) - 130.0).abs() < 1e-9);
    assert_eq!(power30s(30), 100.0);
    assert_eq!(power30s(40), 100.0);

    let power3s = |i: i64| track.get_point(ts(i)).get_f64(&PointField::Power3s).unwrap();
    assert_eq!(power3s(0), 1000.0);
    assert_eq!(power3s(2), 400.0);
    assert_eq!(power3s(3), 100.0);
}

#[test]
fn test_recorded_values_are_kept() {
    let mut track = Track::new();
    let mut first = located(45.0, 7.0);
    first.push((PointField::Distance, Value::from(0.0)));
    first.push((PointField::Speed, Value::from(9.0)));
    track.upsert_point(ts(0), first);
    let mut second = located(45.001, 7.0);
    second.push((PointField::Distance, Value::from(200.0)));
    track.upsert_point(ts(10), second);
    track.set_metadata(MetaField::TotalDistance, 200.0);

    calculate_additional_data(&mut track);

    assert_eq!(track.metadata_f64(&MetaField::TotalDistance), Some(200.0));
    assert_eq!(track.get_point(ts(0)).get_f64(&PointField::Speed), Some(9.0));
    assert_eq!(track.get_point(ts(10)).get_f64(&PointField::Speed), Some(20.0));
    assert_eq!(track.metadata_f64(&MetaField::MaxSpeed), Some(20.0));
    assert!(track.metadata_f64(&MetaField::TotalTrackDistance).unwrap() < 200.0);
}

#[test]
fn test_empty_track() {
    let mut track = Track::new();

    calculate_additional_data(&mut track);

    assert!(track.is_empty());
    assert_eq!(track.metadata_iter().count(), 0);
}

#[test]
fn test_track_without_positions_gets_zero_totals() {
    let mut track = Track::new();
    track.upsert_point(ts(0), [(PointField::Power, Value::from(180.0))]);
    track.upsert_point(ts(10), [(PointField::Power, Value::from(220.0))]);

    calculate_additional_data(&mut track);

    assert_eq!(track.metadata_f64(&MetaField::TotalTrackDistance), Some(0.0));
    assert_eq!(track.metadata_f64(&MetaField::TotalDistance), Some(0.0));
    assert_eq!(track.metadata_f64(&MetaField::MaxTrackSpeed), Some(0.0));
    assert_eq!(track.metadata_f64(&MetaField::MaxSpeed), Some(0.0));
    assert_eq!(track.metadata_f64(&MetaField::AvgTrackSpeed), Some(0.0));
    assert!(!track.get_point(ts(10)).contains(&PointField::TrackDistance));
}

#[test]
fn test_summary_serializes_to_json() {
    let mut track = steady_climb(5);
    track.set_metadata(MetaField::Name, "Climb");

    calculate_additional_data(&mut track);

    let json = serde_json::to_value(track.summary()).unwrap();
    assert_eq!(json["name"], "Climb");
    assert_eq!(json["start_time"], "2024-07-14T09:00:00Z");
    assert_eq!(json["jump_count"], 0);
    assert_eq!(json["total_elapsed_time"], 4.0);
}
