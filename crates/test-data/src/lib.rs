//! Synthetic activity data for exercising `gpst`.
//!
//! Generates complete recordings (position, elevation, speed, heart rate,
//! cadence, power and jumps) over procedural Perlin terrain, with the kinds
//! of defects real devices produce: position noise, lost fixes and
//! out-of-range readings.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let generated = TrackGenerator::for_region(Region::OBERLAND, ElevationGenerator::alpine(7))
//!     .with_distance(10_000.0)
//!     .with_dropouts(0.02)
//!     .generate(&CyclistProfile::default(), &mut rng);
//! ```

pub mod config;
pub mod generators;
pub mod gpx;
pub mod profiles;
pub mod terrain;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region, TrackConfig};
    pub use crate::generators::{GeneratedTrack, TrackGenerator};
    pub use crate::gpx::generate_gpx;
    pub use crate::profiles::{
        AthleteProfile, CyclistProfile, RunnerProfile, sample_variance, speed_at_grade,
    };
    pub use crate::terrain::ElevationGenerator;
    pub use rand::{SeedableRng, rngs::StdRng};
}
