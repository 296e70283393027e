use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use ndarray::Array2;

use crate::error::{InferenceError, ParseError};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParseError> {
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    /// Parses the two text fields of the manual-entry form.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, ParseError> {
        let lat = parse_number("latitude", latitude)?;
        let lon = parse_number("longitude", longitude)?;
        Self::new(lat, lon)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), ParseError> {
    // NaN fails the range test as well.
    if !(-limit..=limit).contains(&value) {
        return Err(ParseError::CoordinateOutOfRange {
            field,
            value,
            min: -limit,
            max: limit,
        });
    }
    Ok(())
}

fn parse_number(field: &'static str, input: &str) -> Result<f64, ParseError> {
    input
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            input: input.to_string(),
        })
}

pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(input.trim(), TIMESTAMP_FORMAT).map_err(|source| {
        ParseError::Timestamp {
            input: input.to_string(),
            source,
        }
    })
}

/// Seconds since the Unix epoch of a wall-clock time in the given offset.
pub fn epoch_seconds(
    timestamp: NaiveDateTime,
    utc_offset_seconds: i32,
) -> Result<i64, InferenceError> {
    let offset = FixedOffset::east_opt(utc_offset_seconds)
        .ok_or(InferenceError::InvalidTimestamp(timestamp))?;
    offset
        .from_local_datetime(&timestamp)
        .single()
        .map(|dt| dt.timestamp())
        .ok_or(InferenceError::InvalidTimestamp(timestamp))
}

/// Model input. Column order is fixed by the fitted artifacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub latitude: f64,
    pub longitude: f64,
    pub epoch_seconds: i64,
}

impl FeatureVector {
    pub fn new(
        coordinate: Coordinate,
        timestamp: NaiveDateTime,
        utc_offset_seconds: i32,
    ) -> Result<Self, InferenceError> {
        Ok(FeatureVector {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            epoch_seconds: epoch_seconds(timestamp, utc_offset_seconds)?,
        })
    }

    /// One row, three f32 columns: latitude, longitude, epoch seconds.
    pub fn to_row(&self) -> Result<Array2<f32>, InferenceError> {
        let values = vec![
            self.latitude as f32,
            self.longitude as f32,
            self.epoch_seconds as f32,
        ];
        Ok(Array2::from_shape_vec((1, 3), values)?)
    }
}
