//! Procedural activity recordings.

use geo::{Destination, Distance, Haversine, Point as GeoPoint};
use gpst::{MetaField, PointField, Track, Value};
use rand::{Rng, seq::SliceRandom};
use rand_distr::{Distribution, Normal};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    config::{BoundingBox, TrackConfig},
    profiles::{self, AthleteProfile},
    terrain::{ElevationGenerator, add_elevation_jitter},
};

const METERS_PER_DEGREE: f64 = 111_320.0;
/// Distance ahead at which terrain is probed for the local grade.
const GRADE_PROBE_M: f64 = 10.0;

/// A generated track plus what went into it, for assertions.
#[derive(Debug, Clone)]
pub struct GeneratedTrack {
    pub track: Track,
    /// Ground distance actually covered, before GPS noise.
    pub true_distance: f64,
    pub samples: usize,
    pub dropouts: usize,
    pub jumps: usize,
    pub glitches: usize,
}

/// Walks a random route over Perlin terrain and records what a head unit
/// would: position, elevation, speed, heart rate, cadence and, for athletes
/// with a power meter, power.
///
/// Samples are inserted into the track in random order.
#[derive(Debug, Clone)]
pub struct TrackGenerator {
    config: TrackConfig,
    elevation: ElevationGenerator,
}

impl TrackGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: TrackConfig::default(),
            elevation: ElevationGenerator::foothills(seed),
        }
    }

    pub fn for_region(bounds: BoundingBox, elevation: ElevationGenerator) -> Self {
        Self {
            config: TrackConfig {
                bounds,
                ..Default::default()
            },
            elevation,
        }
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start_point = Some((lat, lon));
        self
    }

    pub fn with_sample_interval(mut self, seconds: f64) -> Self {
        self.config.sample_interval_s = seconds;
        self
    }

    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    pub fn with_elevation_jitter(mut self, meters: f64) -> Self {
        self.config.elevation_jitter_m = meters;
        self
    }

    pub fn with_dropouts(mut self, probability: f64) -> Self {
        self.config.dropout_probability = probability;
        self
    }

    pub fn with_jumps(mut self, probability: f64) -> Self {
        self.config.jump_probability = probability;
        self
    }

    pub fn with_glitches(mut self, probability: f64) -> Self {
        self.config.glitch_probability = probability;
        self
    }

    pub fn generate(&self, profile: &dyn AthleteProfile, rng: &mut impl Rng) -> GeneratedTrack {
        let (lat, lon) = self
            .config
            .start_point
            .unwrap_or_else(|| self.config.bounds.random_point(rng));
        let mut position = GeoPoint::new(lon, lat);
        let mut heading: f64 = rng.gen_range(0.0..360.0);

        let dt = self.config.sample_interval_s.max(0.1);
        let gps_noise = Normal::new(0.0, self.config.gps_jitter_m.max(0.0)).ok();

        let mut samples: Vec<(OffsetDateTime, Vec<(PointField, Value)>)> = Vec::new();
        let mut result = GeneratedTrack {
            track: Track::new(),
            true_distance: 0.0,
            samples: 0,
            dropouts: 0,
            jumps: 0,
            glitches: 0,
        };
        let (rest_hr, _) = profile.heart_rate_range();
        let mut heart_rate = rest_hr;
        let mut elapsed = 0.0_f64;

        loop {
            let timestamp = self.config.start_time + Duration::seconds_f64(elapsed);
            let terrain = self.elevation.elevation_at(position.y(), position.x());
            let ahead = Haversine.destination(position, heading, GRADE_PROBE_M);
            let grade = (self.elevation.elevation_at(ahead.y(), ahead.x()) - terrain) / GRADE_PROBE_M;

            let variance = profiles::sample_variance(profile, rng);
            let speed = profiles::speed_at_grade(profile, grade, variance);
            let power = profile.power_watts(speed, grade);
            let intensity = match power {
                Some(watts) => watts / 350.0,
                None => speed / (profile.base_speed_mps() * 1.5) + grade * 5.0,
            };
            heart_rate = profiles::heart_rate_step(profile, heart_rate, intensity, dt);

            let mut fields = vec![
                (PointField::Timestamp, Value::from(timestamp)),
                (
                    PointField::Elevation,
                    Value::from(add_elevation_jitter(terrain, rng, self.config.elevation_jitter_m)),
                ),
                (PointField::Speed, Value::from(speed)),
                (PointField::HeartRate, Value::from(heart_rate.round())),
                (PointField::Cadence, Value::Int(profile.cadence(speed).round() as i64)),
            ];
            if let Some(watts) = power {
                fields.push((PointField::Power, Value::from(watts.round())));
            }

            if rng.gen_bool(self.config.dropout_probability.clamp(0.0, 1.0)) {
                result.dropouts += 1;
            } else {
                let (lat, lon) = jittered(position, gps_noise.as_ref(), rng);
                fields.push((PointField::Latitude, Value::from(lat)));
                fields.push((PointField::Longitude, Value::from(lon)));
            }

            if rng.gen_bool(self.config.jump_probability.clamp(0.0, 1.0)) {
                result.jumps += 1;
                fields.extend(jump_fields(rng));
            }

            if rng.gen_bool(self.config.glitch_probability.clamp(0.0, 1.0)) {
                result.glitches += 1;
                fields.push((PointField::Power, Value::from(-1.0)));
            }

            samples.push((timestamp, fields));

            if result.true_distance >= self.config.distance_meters {
                break;
            }

            heading = (heading + rng.gen_range(-8.0..8.0)).rem_euclid(360.0);
            let mut next = Haversine.destination(position, heading, speed * dt);
            if !self.config.bounds.contains(next.y(), next.x()) {
                heading = (heading + 180.0).rem_euclid(360.0);
                next = Haversine.destination(position, heading, speed * dt);
            }
            result.true_distance += Haversine.distance(position, next);
            position = next;
            elapsed += dt;
        }

        result.samples = samples.len();
        samples.shuffle(rng);
        for (timestamp, fields) in samples {
            result.track.upsert_point(timestamp, fields);
        }
        result.track.set_metadata(MetaField::Sport, profile.sport());

        debug!(
            "Generated {} with {} dropouts, {} jumps, {} glitches",
            result.track, result.dropouts, result.jumps, result.glitches
        );
        result
    }
}

fn jittered(position: GeoPoint<f64>, noise: Option<&Normal<f64>>, rng: &mut impl Rng) -> (f64, f64) {
    let Some(noise) = noise else {
        return (position.y(), position.x());
    };
    let lat = position.y() + noise.sample(rng) / METERS_PER_DEGREE;
    let lon = position.x() + noise.sample(rng) / (METERS_PER_DEGREE * position.y().to_radians().cos());
    (lat, lon)
}

fn jump_fields(rng: &mut impl Rng) -> Vec<(PointField, Value)> {
    let hang_time: f64 = rng.gen_range(0.2..1.5);
    vec![
        (PointField::JumpHangTime, Value::from(hang_time)),
        (PointField::JumpDistance, Value::from(hang_time * rng.gen_range(4.0..9.0))),
        (PointField::JumpHeight, Value::from(hang_time * hang_time * 1.2)),
        (PointField::JumpRotations, Value::Int(0)),
        (PointField::JumpScore, Value::from(rng.gen_range(10.0..100.0))),
    ]
}
