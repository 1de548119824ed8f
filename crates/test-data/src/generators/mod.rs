//! Generators for synthetic activity data.
//!
//! - [`TrackGenerator`]: a full sensor recording along a procedural route

pub mod track;

pub use track::{GeneratedTrack, TrackGenerator};
