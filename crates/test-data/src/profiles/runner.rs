//! Runner athlete profile.

use super::AthleteProfile;

/// Runner without a power meter.
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    base_speed: f64,
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.5, // ~4:45/km
            variance: 0.08,
        }
    }
}

impl RunnerProfile {
    /// Profile with a flat-ground pace in minutes per kilometer.
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        Self {
            base_speed: 1000.0 / (pace_min_per_km * 60.0),
            ..Default::default()
        }
    }

    pub fn elite() -> Self {
        Self::with_pace(3.2)
    }
}

impl AthleteProfile for RunnerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 15.0).max(0.25)
        } else {
            (1.0 - grade * 8.0).min(1.3)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn cadence(&self, speed: f64) -> f64 {
        (150.0 + speed * 8.0).min(200.0)
    }

    fn sport(&self) -> &'static str {
        "running"
    }

    fn heart_rate_range(&self) -> (f64, f64) {
        (50.0, 192.0)
    }
}
