//! Cyclist athlete profile.

use super::AthleteProfile;

const GRAVITY: f64 = 9.81;
const AIR_DENSITY: f64 = 1.2;

/// Road cyclist with a power meter.
///
/// Power follows the usual rolling resistance, gravity and aerodynamic drag
/// terms. Descending never produces negative power: the rider coasts.
#[derive(Debug, Clone)]
pub struct CyclistProfile {
    base_speed: f64,
    variance: f64,
    /// Rider plus bike, kg.
    system_mass: f64,
    /// Drag area, m^2.
    cda: f64,
    crr: f64,
}

impl Default for CyclistProfile {
    fn default() -> Self {
        Self {
            base_speed: 8.0,
            variance: 0.10,
            system_mass: 80.0,
            cda: 0.32,
            crr: 0.005,
        }
    }
}

impl CyclistProfile {
    /// Profile with a flat-ground speed in km/h.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            ..Default::default()
        }
    }
}

impl AthleteProfile for CyclistProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 25.0).max(0.15)
        } else {
            (1.0 - grade * 15.0).min(2.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn power_watts(&self, speed: f64, grade: f64) -> Option<f64> {
        let rolling = self.crr * self.system_mass * GRAVITY;
        let climbing = self.system_mass * GRAVITY * grade;
        let drag = 0.5 * AIR_DENSITY * self.cda * speed * speed;
        Some(((rolling + climbing + drag) * speed).clamp(0.0, 2000.0))
    }

    fn cadence(&self, speed: f64) -> f64 {
        (60.0 + speed * 3.5).min(110.0)
    }

    fn sport(&self) -> &'static str {
        "cycling"
    }
}
