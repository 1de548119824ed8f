use gpst::{MetaField, PointField, Track, calculate_additional_data, file_parsers::parse_gpx};
use test_data::prelude::*;

fn ride(seed: u64) -> GeneratedTrack {
    let mut rng = StdRng::seed_from_u64(seed);
    TrackGenerator::for_region(Region::OBERLAND, ElevationGenerator::alpine(seed as u32))
        .with_distance(3000.0)
        .with_dropouts(0.05)
        .with_jumps(0.02)
        .with_glitches(0.02)
        .generate(&CyclistProfile::default(), &mut rng)
}

fn clean_run(seed: u64) -> GeneratedTrack {
    let mut rng = StdRng::seed_from_u64(seed);
    TrackGenerator::new(seed as u32)
        .with_distance(2000.0)
        .with_gps_jitter(0.0)
        .with_elevation_jitter(0.0)
        .with_dropouts(0.0)
        .generate(&RunnerProfile::default(), &mut rng)
}

fn polder_run(seed: u64, profile: &RunnerProfile) -> GeneratedTrack {
    let mut rng = StdRng::seed_from_u64(seed);
    let (lat, lon) = Region::FLEVOLAND.center();
    TrackGenerator::for_region(Region::FLEVOLAND, ElevationGenerator::flat(seed as u32))
        .with_start(lat, lon)
        .with_distance(1500.0)
        .with_gps_jitter(0.0)
        .with_elevation_jitter(0.0)
        .with_dropouts(0.0)
        .generate(profile, &mut rng)
}

fn values(track: &Track, key: PointField) -> Vec<f64> {
    track
        .points_iter()
        .filter_map(|(_, p)| p.get_f64(&key))
        .collect()
}

#[test]
fn test_distances_are_monotonic() {
    for seed in [1, 2, 3] {
        let mut generated = ride(seed);
        calculate_additional_data(&mut generated.track);
        let track = &generated.track;

        let distances = values(track, PointField::TrackDistance);
        assert_eq!(distances.len(), generated.samples - generated.dropouts);
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));

        let total = track.metadata_f64(&MetaField::TotalTrackDistance).unwrap();
        assert_eq!(distances.last().copied(), Some(total));
    }
}

#[test]
fn test_every_point_gets_time() {
    let mut generated = ride(4);
    calculate_additional_data(&mut generated.track);

    let times = values(&generated.track, PointField::Time);
    assert_eq!(times.len(), generated.track.len());
    assert_eq!(times.first().copied(), Some(0.0));
    assert!(times.windows(2).all(|w| w[0] < w[1]));

    let elapsed = generated
        .track
        .metadata_f64(&MetaField::TotalElapsedTime)
        .unwrap();
    assert_eq!(times.last().copied(), Some(elapsed));
}

#[test]
fn test_glitches_rejected_and_averages_bounded() {
    let mut generated = ride(5);
    assert!(generated.glitches > 0);
    calculate_additional_data(&mut generated.track);
    let track = &generated.track;

    let power = values(track, PointField::Power);
    assert!(power.iter().all(|p| *p >= 0.0));
    let lo = power.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = power.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for key in [PointField::Power3s, PointField::Power10s, PointField::Power30s] {
        let averages = values(track, key);
        assert_eq!(averages.len(), track.len());
        assert!(averages.iter().all(|p| *p >= lo - 1e-9 && *p <= hi + 1e-9));
    }
}

#[test]
fn test_smoothed_elevation_stays_in_range() {
    let mut generated = ride(6);
    calculate_additional_data(&mut generated.track);
    let track = &generated.track;

    let elevation = values(track, PointField::Elevation);
    let lo = elevation.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = elevation.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let smoothed = values(track, PointField::SmoothElevation);
    assert_eq!(smoothed.len(), track.len());
    assert!(smoothed.iter().all(|e| *e >= lo - 1e-9 && *e <= hi + 1e-9));
}

#[test]
fn test_jump_count_matches() {
    let mut generated = ride(7);
    calculate_additional_data(&mut generated.track);

    let jump_count = generated.track.metadata(&MetaField::JumpCount).and_then(|v| v.as_i64());
    assert_eq!(jump_count, Some(generated.jumps as i64));
}

#[test]
fn test_grade_extremes_bracket_point_grades() {
    let mut generated = ride(8);
    calculate_additional_data(&mut generated.track);
    let track = &generated.track;

    let grades = values(track, PointField::Grade);
    assert!(!grades.is_empty());
    let max_grade = track.metadata_f64(&MetaField::MaxGrade).unwrap();
    let min_grade = track.metadata_f64(&MetaField::MinGrade).unwrap();
    assert!(grades.iter().all(|g| *g <= max_grade && *g >= min_grade));
}

#[test]
fn test_noiseless_distance_matches_route() {
    let mut generated = clean_run(9);
    calculate_additional_data(&mut generated.track);

    let total = generated
        .track
        .metadata_f64(&MetaField::TotalTrackDistance)
        .unwrap();
    assert!((total - generated.true_distance).abs() < 1e-6 * generated.true_distance);
}

#[test]
fn test_calculation_is_idempotent() {
    let mut generated = ride(10);
    calculate_additional_data(&mut generated.track);
    let once = generated.track.clone();
    calculate_additional_data(&mut generated.track);

    assert_eq!(generated.track, once);
}

#[test]
fn test_gpx_round_trip_keeps_distance() {
    let mut generated = clean_run(11);
    let gpx = generate_gpx(&generated.track, "Lunch Run");
    let mut parsed = parse_gpx(&gpx).unwrap();

    calculate_additional_data(&mut generated.track);
    calculate_additional_data(&mut parsed);

    let original = generated
        .track
        .metadata_f64(&MetaField::TotalTrackDistance)
        .unwrap();
    let reparsed = parsed.metadata_f64(&MetaField::TotalTrackDistance).unwrap();
    assert!((original - reparsed).abs() < 0.005 * original);
    assert_eq!(parsed.len(), generated.track.len());
}

#[test]
fn test_flat_terrain_has_near_zero_grade() {
    let mut generated = polder_run(12, &RunnerProfile::default());
    calculate_additional_data(&mut generated.track);
    let track = &generated.track;

    let (lat, lon) = Region::FLEVOLAND.center();
    let start = track.points_iter().next().map(|(_, p)| {
        (
            p.get_f64(&PointField::Latitude).unwrap(),
            p.get_f64(&PointField::Longitude).unwrap(),
        )
    });
    assert_eq!(start, Some((lat, lon)));

    assert!(!values(track, PointField::Grade).is_empty());
    let max_grade = track.metadata_f64(&MetaField::MaxGrade).unwrap();
    let min_grade = track.metadata_f64(&MetaField::MinGrade).unwrap();
    assert!(max_grade.abs() < 2.0, "max grade {max_grade}");
    assert!(min_grade.abs() < 2.0, "min grade {min_grade}");
}

#[test]
fn test_elite_runner_is_faster() {
    let mut easy = polder_run(13, &RunnerProfile::default());
    let mut elite = polder_run(13, &RunnerProfile::elite());
    calculate_additional_data(&mut easy.track);
    calculate_additional_data(&mut elite.track);

    let avg = |generated: &GeneratedTrack| {
        generated
            .track
            .metadata_f64(&MetaField::AvgTrackSpeed)
            .unwrap()
    };
    assert!(avg(&elite) > avg(&easy) * 1.2);
}
