//! Activity track processing.
//!
//! Tracks are loaded from FIT or GPX files ([`file_parsers`]), enriched with
//! derived metrics ([`calculator`]) and written back out as GPX
//! ([`gpx_writer`]). Every value stored in a [`Track`] is checked against the
//! field registry in [`field`].

pub mod calculator;
pub mod errors;
pub mod field;
pub mod file_parsers;
pub mod gpx_writer;
pub mod tools;
pub mod track;
pub mod window;

pub use calculator::{CalculatorConfig, calculate_additional_data, calculate_additional_data_with};
pub use errors::{ReadError, ValidationError, WriteError};
pub use field::{FieldType, MetaField, PointField, Value, ValueKind};
pub use file_parsers::{FileType, read_track};
pub use gpx_writer::write_track;
pub use track::{Point, Track};
pub use window::{SlidingWindows, Window};
