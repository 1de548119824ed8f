//! Perlin noise-based elevation.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_distr::{Distribution, Normal};

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Elevation field built from several octaves of Perlin noise.
///
/// Coordinates are projected to meters before sampling, so `wavelength_m`
/// is the horizontal size of the largest hills regardless of latitude.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    /// Mean elevation in meters.
    base_elevation: f64,
    /// Peak deviation from the base, in meters.
    relief: f64,
    wavelength_m: f64,
    octaves: u32,
}

impl ElevationGenerator {
    /// Rolling hills, a few hundred meters above sea level.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 400.0,
            relief: 60.0,
            wavelength_m: 3000.0,
            octaves: 3,
        }
    }

    pub fn foothills(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1650.0,
            relief: 250.0,
            wavelength_m: 4000.0,
            octaves: 4,
        }
    }

    /// Long steep climbs.
    pub fn alpine(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1400.0,
            relief: 900.0,
            wavelength_m: 6000.0,
            octaves: 5,
        }
    }

    /// Reclaimed land a few meters below sea level.
    pub fn flat(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: -3.0,
            relief: 2.0,
            wavelength_m: 1500.0,
            octaves: 2,
        }
    }

    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    pub fn relief(&self) -> f64 {
        self.relief
    }

    /// Elevation in meters at a coordinate.
    pub fn elevation_at(&self, lat: f64, lon: f64) -> f64 {
        let y = lat * METERS_PER_DEGREE;
        let x = lon * METERS_PER_DEGREE * lat.to_radians().cos();

        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0 / self.wavelength_m;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        self.base_elevation + (total / max_amplitude) * self.relief
    }
}

/// Adds Gaussian sensor noise to an elevation reading. A non-positive or
/// non-finite `std_dev` leaves the reading unchanged.
pub fn add_elevation_jitter(elevation: f64, rng: &mut impl Rng, std_dev: f64) -> f64 {
    match Normal::new(0.0, std_dev) {
        Ok(normal) if std_dev > 0.0 => elevation + normal.sample(rng),
        _ => elevation,
    }
}
