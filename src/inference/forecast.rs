//! Day-by-day forecast series built from repeated raw predictions.

use chrono::{NaiveDate, NaiveTime};
use rand::Rng;
use serde::Serialize;

use crate::config::NoiseModel;
use crate::data::preprocessing::Coordinate;
use crate::error::InferenceError;
use crate::inference::diurnal;
use crate::inference::pipeline::InferencePipeline;

pub const DEFAULT_SAMPLE_HOURS: [u32; 4] = [0, 6, 12, 18];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f32,
}

/// Finite iterator over one point per day, ascending. Stops after the
/// first error.
pub struct ForecastSeries<'a, R: Rng + ?Sized> {
    pipeline: InferencePipeline<'a>,
    coordinate: Coordinate,
    next_date: NaiveDate,
    remaining: u32,
    sample_hours: Vec<u32>,
    noise: NoiseModel,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> ForecastSeries<'a, R> {
    pub fn new(
        pipeline: InferencePipeline<'a>,
        coordinate: Coordinate,
        start: NaiveDate,
        days: u32,
        rng: &'a mut R,
    ) -> Self {
        ForecastSeries {
            pipeline,
            coordinate,
            next_date: start,
            remaining: days,
            sample_hours: DEFAULT_SAMPLE_HOURS.to_vec(),
            noise: NoiseModel::Flat,
            rng,
        }
    }

    /// Hours of the day sampled per point. Each must be below 24 and the
    /// list must not be empty, otherwise the first point is an error.
    pub fn sample_hours(mut self, hours: &[u32]) -> Self {
        self.sample_hours = hours.to_vec();
        self
    }

    pub fn noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }

    fn point_for(&mut self, date: NaiveDate) -> Result<ForecastPoint, InferenceError> {
        if self.sample_hours.is_empty() {
            return Err(InferenceError::NoSamples);
        }
        let mut total = 0.0f32;
        for &hour in &self.sample_hours {
            let time = NaiveTime::from_hms_opt(hour, 0, 0)
                .ok_or(InferenceError::InvalidTimestamp(date.and_time(NaiveTime::MIN)))?;
            let raw = self.pipeline.predict(self.coordinate, date.and_time(time))?;
            total += match self.noise {
                NoiseModel::Flat => raw,
                NoiseModel::Diurnal => diurnal::adjust(raw, hour, &mut *self.rng),
            };
        }
        let mean = total / self.sample_hours.len() as f32;

        let value = match self.noise {
            NoiseModel::Flat => (mean + self.rng.gen_range(-1.0f32..=1.0)).max(0.0),
            NoiseModel::Diurnal => mean,
        };
        Ok(ForecastPoint { date, value })
    }
}

impl<R: Rng + ?Sized> Iterator for ForecastSeries<'_, R> {
    type Item = Result<ForecastPoint, InferenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let date = self.next_date;
        let point = self.point_for(date);
        match (&point, date.succ_opt()) {
            (Ok(_), Some(next)) => self.next_date = next,
            _ => self.remaining = 0,
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Collects a flat-noise series over the default sample hours.
pub fn forecast<R: Rng + ?Sized>(
    pipeline: InferencePipeline<'_>,
    coordinate: Coordinate,
    start: NaiveDate,
    days: u32,
    rng: &mut R,
) -> Result<Vec<ForecastPoint>, InferenceError> {
    ForecastSeries::new(pipeline, coordinate, start, days, rng).collect()
}
