//! Athlete models.
//!
//! A profile turns terrain into movement (speed on a given grade) and
//! movement into the sensor streams a head unit would record.

mod cyclist;
mod runner;

pub use cyclist::CyclistProfile;
pub use runner::RunnerProfile;

use rand_distr::{Distribution, Normal};

pub trait AthleteProfile: Send + Sync {
    /// Speed on flat ground in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a grade given as a fraction (0.05 = 5 %).
    fn grade_factor(&self, grade: f64) -> f64;

    /// Sample-to-sample speed variation as a coefficient of variation.
    fn variance(&self) -> f64;

    /// Mechanical power in watts, for athletes carrying a power meter.
    fn power_watts(&self, _speed: f64, _grade: f64) -> Option<f64> {
        None
    }

    /// Cadence in rpm (cycling) or steps per minute (running).
    fn cadence(&self, speed: f64) -> f64;

    /// Value recorded as `sport` in the track summary.
    fn sport(&self) -> &'static str;

    /// Heart rate at rest and at maximum effort.
    fn heart_rate_range(&self) -> (f64, f64) {
        (55.0, 185.0)
    }
}

/// Speed for one sample.
pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let target = profile.base_speed_mps() * profile.grade_factor(grade);
    (target * variance_factor).max(0.5)
}

/// Samples a multiplier around 1.0 from the profile's variance.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => normal.sample(rng).clamp(0.7, 1.4),
        _ => 1.0,
    }
}

/// Heart rate trailing `intensity` (0 to 1) with a first-order lag.
pub fn heart_rate_step(profile: &dyn AthleteProfile, previous: f64, intensity: f64, dt: f64) -> f64 {
    const TIME_CONSTANT_S: f64 = 30.0;

    let (rest, max) = profile.heart_rate_range();
    let target = rest + (max - rest) * intensity.clamp(0.0, 1.0);
    let alpha = (dt / TIME_CONSTANT_S).min(1.0);
    previous + (target - previous) * alpha
}
