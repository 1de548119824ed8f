//! Typed field registry.
//!
//! Every value stored on a [`Point`](crate::track::Point) or in a track's
//! summary table is a [`Value`]. Recognized keys are variants of
//! [`PointField`] and [`MetaField`]; each one carries a static [`FieldType`]
//! describing the expected kind, unit and inclusive range. Keys without a
//! registry entry land in the `Other` variant: they are stored as-is and only
//! warned about.

use std::fmt;

use serde::{Serialize, Serializer};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::errors::ValidationError;

/// Kind tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Text,
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single stored field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(OffsetDateTime),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<OffsetDateTime> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Timestamp(v) => f.write_str(&timestamp_str(*v)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Timestamp(v) => serializer.serialize_str(&timestamp_str(*v)),
        }
    }
}

/// Formats a timestamp as RFC 3339 in UTC.
pub fn timestamp_str(timestamp: OffsetDateTime) -> String {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Static descriptor of a registered field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldType {
    pub name: &'static str,
    /// `None` accepts any kind.
    pub kind: Option<ValueKind>,
    pub unit: Option<&'static str>,
    pub symbol: Option<&'static str>,
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
}

impl FieldType {
    const fn new(
        name: &'static str,
        kind: Option<ValueKind>,
        unit: Option<&'static str>,
        symbol: Option<&'static str>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self {
            name,
            kind,
            unit,
            symbol,
            min,
            max,
        }
    }

    /// Checks `value` against this type, widening integers where a float is
    /// expected. Returns the value to store.
    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let value = match (self.kind, value) {
            (Some(ValueKind::Float), Value::Int(v)) => Value::Float(v as f64),
            (_, value) => value,
        };

        if let Some(expected) = self.kind
            && value.kind() != expected
        {
            return Err(ValidationError::WrongKind {
                expected,
                found: value.kind(),
            });
        }

        if let Some(number) = value.as_f64() {
            if !number.is_finite() {
                return Err(ValidationError::NotFinite(number));
            }
            if let Some(min) = self.min
                && number < min
            {
                return Err(ValidationError::BelowMinimum { value: number, min });
            }
            if let Some(max) = self.max
                && number > max
            {
                return Err(ValidationError::AboveMaximum { value: number, max });
            }
        }

        Ok(value)
    }
}

use ValueKind::{Float, Int, Text, Timestamp};

pub static CADENCE: FieldType = FieldType::new(
    "cadence",
    Some(Int),
    Some("revolutions per minute"),
    Some("rpm"),
    Some(0.0),
    None,
);
pub static CALORIES: FieldType = FieldType::new(
    "calories",
    Some(Float),
    Some("kilocalories"),
    Some("kcal"),
    Some(0.0),
    None,
);
pub static DISTANCE: FieldType = FieldType::new(
    "distance",
    Some(Float),
    Some("meters"),
    Some("m"),
    Some(0.0),
    None,
);
pub static ELEVATION: FieldType =
    FieldType::new("elevation", Some(Float), Some("meters"), Some("m"), None, None);
// Signed: descents produce negative grades.
pub static GRADE: FieldType =
    FieldType::new("grade", Some(Float), Some("percent"), Some("%"), None, None);
pub static HEART_RATE: FieldType = FieldType::new(
    "heart rate",
    Some(Float),
    Some("beats per minute"),
    Some("bpm"),
    Some(0.0),
    None,
);
pub static LATITUDE: FieldType = FieldType::new(
    "latitude",
    Some(Float),
    Some("degrees"),
    Some("°"),
    Some(-90.0),
    Some(90.0),
);
pub static LONGITUDE: FieldType = FieldType::new(
    "longitude",
    Some(Float),
    Some("degrees"),
    Some("°"),
    Some(-180.0),
    Some(180.0),
);
pub static POWER: FieldType =
    FieldType::new("power", Some(Float), Some("watts"), Some("W"), Some(0.0), None);
pub static RESPIRATION_RATE: FieldType = FieldType::new(
    "respiration rate",
    Some(Float),
    Some("breaths per minute"),
    Some("bpm"),
    Some(0.0),
    None,
);
pub static SPEED: FieldType = FieldType::new(
    "speed",
    Some(Float),
    Some("meters per second"),
    Some("m/s"),
    Some(0.0),
    None,
);
pub static VERTICAL_SPEED: FieldType = FieldType::new(
    "vertical speed",
    Some(Float),
    Some("meters per second"),
    Some("m/s"),
    None,
    None,
);
pub static TEETH: FieldType = FieldType::new(
    "teeth",
    Some(Int),
    Some("number of teeth"),
    Some("teeth"),
    Some(1.0),
    None,
);
pub static TEMPERATURE: FieldType = FieldType::new(
    "temperature",
    Some(Float),
    Some("degrees Celsius"),
    Some("°C"),
    Some(-273.15),
    None,
);
pub static TIMESTAMP: FieldType =
    FieldType::new("timestamp", Some(Timestamp), None, None, None, None);
pub static TIME: FieldType =
    FieldType::new("time", Some(Float), Some("seconds"), Some("s"), Some(0.0), None);
pub static WORK: FieldType =
    FieldType::new("work", Some(Int), Some("joules"), Some("J"), Some(0.0), None);

pub static INT: FieldType = FieldType::new("int", Some(Int), None, None, None, None);
pub static FLOAT: FieldType = FieldType::new("float", Some(Float), None, None, None, None);
pub static PERCENT: FieldType = FieldType::new(
    "percent",
    Some(Float),
    Some("percent"),
    Some("%"),
    Some(0.0),
    Some(100.0),
);
pub static STRING: FieldType = FieldType::new("string", Some(Text), None, None, None, None);

/// Declares a closed key enumeration with a catch-all `Other` variant,
/// mapping every known key to its snake_case name and registry entry.
macro_rules! field_keys {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $key:literal : $ty:ident, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $variant, )*
            /// Key without a registry entry.
            Other(String),
        }

        impl $name {
            /// Every registered key, in declaration order.
            pub const KNOWN: &'static [$name] = &[$( $name::$variant, )*];

            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $key, )*
                    $name::Other(key) => key,
                }
            }

            /// Registry entry, `None` for unknown keys.
            pub fn field_type(&self) -> Option<&'static FieldType> {
                match self {
                    $( $name::$variant => Some(&$ty), )*
                    $name::Other(_) => None,
                }
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                match key {
                    $( $key => $name::$variant, )*
                    other => $name::Other(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                $name::from(key.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

field_keys! {
    /// Per-point field keys.
    pub enum PointField {
        Time => "time": TIME,
        Timestamp => "timestamp": TIMESTAMP,
        Latitude => "latitude": LATITUDE,
        Longitude => "longitude": LONGITUDE,
        Elevation => "elevation": ELEVATION,
        SmoothElevation => "smooth_elevation": ELEVATION,
        HeartRate => "heart_rate": HEART_RATE,
        Cadence => "cadence": CADENCE,
        Distance => "distance": DISTANCE,
        TrackDistance => "track_distance": DISTANCE,
        Speed => "speed": SPEED,
        TrackSpeed => "track_speed": SPEED,
        Power => "power": POWER,
        Power3s => "power3s": POWER,
        Power10s => "power10s": POWER,
        Power30s => "power30s": POWER,
        Grade => "grade": GRADE,
        Temperature => "temperature": TEMPERATURE,
        AccumulatedPower => "accumulated_power": POWER,
        GpsAccuracy => "gps_accuracy": DISTANCE,
        VerticalSpeed => "vertical_speed": VERTICAL_SPEED,
        Calories => "calories": CALORIES,
        LeftTorqueEffectiveness => "left_torque_effectiveness": PERCENT,
        RightTorqueEffectiveness => "right_torque_effectiveness": PERCENT,
        LeftPedalSmoothness => "left_pedal_smoothness": PERCENT,
        RightPedalSmoothness => "right_pedal_smoothness": PERCENT,
        CombinedPedalSmoothness => "combined_pedal_smoothness": PERCENT,
        RespirationRate => "respiration_rate": RESPIRATION_RATE,
        Grit => "grit": FLOAT,
        Flow => "flow": FLOAT,
        CoreTemperature => "core_temperature": TEMPERATURE,
        FrontGearNum => "front_gear_num": INT,
        FrontGear => "front_gear": TEETH,
        RearGearNum => "rear_gear_num": INT,
        RearGear => "rear_gear": TEETH,
        ActiveClimb => "active_climb": INT,
        JumpDistance => "jump_distance": DISTANCE,
        JumpHeight => "jump_height": DISTANCE,
        JumpRotations => "jump_rotations": INT,
        JumpHangTime => "jump_hang_time": TIME,
        JumpScore => "jump_score": FLOAT,
    }
}

field_keys! {
    /// Whole-track summary keys.
    pub enum MetaField {
        StartTime => "start_time": TIMESTAMP,
        EndTime => "end_time": TIMESTAMP,
        StartPositionLat => "start_position_lat": LATITUDE,
        StartPositionLong => "start_position_long": LONGITUDE,
        EndPositionLat => "end_position_lat": LATITUDE,
        EndPositionLong => "end_position_long": LONGITUDE,
        MinLat => "minlat": LATITUDE,
        MinLon => "minlon": LONGITUDE,
        MaxLat => "maxlat": LATITUDE,
        MaxLon => "maxlon": LONGITUDE,
        TotalElapsedTime => "total_elapsed_time": TIME,
        TotalTimerTime => "total_timer_time": TIME,
        TotalDistance => "total_distance": DISTANCE,
        TotalTrackDistance => "total_track_distance": DISTANCE,
        TotalCycles => "total_cycles": INT,
        TotalWork => "total_work": WORK,
        AvgSpeed => "avg_speed": SPEED,
        MaxSpeed => "max_speed": SPEED,
        AvgTrackSpeed => "avg_track_speed": SPEED,
        MaxTrackSpeed => "max_track_speed": SPEED,
        MaxGrade => "max_grade": GRADE,
        MinGrade => "min_grade": GRADE,
        TrainingLoadPeak => "training_load_peak": FLOAT,
        TotalGrit => "total_grit": FLOAT,
        AvgFlow => "avg_flow": FLOAT,
        TotalCalories => "total_calories": CALORIES,
        AvgPower => "avg_power": POWER,
        MaxPower => "max_power": POWER,
        TotalAscent => "total_ascent": ELEVATION,
        TotalDescent => "total_descent": ELEVATION,
        NormalizedPower => "normalized_power": POWER,
        TrainingStressScore => "training_stress_score": FLOAT,
        IntensityFactor => "intensity_factor": FLOAT,
        ThresholdPower => "threshold_power": POWER,
        AvgVam => "avg_vam": SPEED,
        AvgRespirationRate => "avg_respiration_rate": RESPIRATION_RATE,
        MaxRespirationRate => "max_respiration_rate": RESPIRATION_RATE,
        MinRespirationRate => "min_respiration_rate": RESPIRATION_RATE,
        JumpCount => "jump_count": INT,
        AvgRightTorqueEffectiveness => "avg_right_torque_effectiveness": PERCENT,
        AvgLeftTorqueEffectiveness => "avg_left_torque_effectiveness": PERCENT,
        AvgRightPedalSmoothness => "avg_right_pedal_smoothness": PERCENT,
        AvgLeftPedalSmoothness => "avg_left_pedal_smoothness": PERCENT,
        AvgHeartRate => "avg_heart_rate": HEART_RATE,
        MaxHeartRate => "max_heart_rate": HEART_RATE,
        AvgCadence => "avg_cadence": CADENCE,
        MaxCadence => "max_cadence": CADENCE,
        AvgTemperature => "avg_temperature": TEMPERATURE,
        MaxTemperature => "max_temperature": TEMPERATURE,
        MinTemperature => "min_temperature": TEMPERATURE,
        TotalAnaerobicTrainingEffect => "total_anaerobic_training_effect": FLOAT,
        TotalStrokes => "total_strokes": INT,
        SportProfileName => "sport_profile_name": STRING,
        Sport => "sport": STRING,
        SubSport => "sub_sport": STRING,
        Name => "name": STRING,
        Device => "device": STRING,
    }
}
