//! Configuration types for synthetic track generation.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, macros::datetime};

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Pre-defined regions with distinct terrain character.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Boulder, CO foothills.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.9, -105.5, 40.1, -105.2);

    /// Bernese Oberland, steep alpine valleys.
    pub const OBERLAND: BoundingBox = BoundingBox::new(46.5, 7.6, 46.8, 8.1);

    /// Flevoland polders, essentially flat.
    pub const FLEVOLAND: BoundingBox = BoundingBox::new(52.3, 5.2, 52.6, 5.8);
}

/// Knobs for one generated track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Target distance in meters.
    pub distance_meters: f64,
    /// Seconds between samples.
    pub sample_interval_s: f64,
    /// Starting point (lat, lon). Random within `bounds` if unset.
    pub start_point: Option<(f64, f64)>,
    pub bounds: BoundingBox,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// Position noise standard deviation in meters.
    pub gps_jitter_m: f64,
    /// Barometric noise standard deviation in meters.
    pub elevation_jitter_m: f64,
    /// Chance per sample that the position fix is lost.
    pub dropout_probability: f64,
    /// Chance per sample that a jump is recorded.
    pub jump_probability: f64,
    /// Chance per sample of a single out-of-range reading that the track
    /// store should reject.
    pub glitch_probability: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            distance_meters: 5000.0,
            sample_interval_s: 1.0,
            start_point: None,
            bounds: Region::BOULDER,
            start_time: datetime!(2024-06-01 07:00:00 UTC),
            gps_jitter_m: 3.0,
            elevation_jitter_m: 1.5,
            dropout_probability: 0.01,
            jump_probability: 0.0,
            glitch_probability: 0.0,
        }
    }
}
