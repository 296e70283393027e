//! Application context and the single-submission boundary.
//!
//! Every per-interaction failure ends here as a [`FormError`]; nothing a
//! user types can take the process down.

use chrono::{NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::data::places::PlaceTable;
use crate::data::preprocessing::{Coordinate, parse_timestamp};
use crate::error::{FormError, StartupError};
use crate::inference::diurnal;
use crate::inference::forecast::{ForecastPoint, ForecastSeries};
use crate::inference::pipeline::InferencePipeline;
use crate::model::artifacts::{ArtifactCache, Artifacts};

#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Manual { latitude: f64, longitude: f64 },
    Place(String),
}

impl LocationInput {
    /// Manual entry from the two text fields, validated the same way as
    /// any other coordinate.
    pub fn manual_from_text(latitude: &str, longitude: &str) -> Result<Self, FormError> {
        let coordinate = Coordinate::parse(latitude, longitude)?;
        Ok(LocationInput::Manual {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub location: LocationInput,
    pub timestamp: String,
}

/// Result of one successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub coordinate: Coordinate,
    pub timestamp: NaiveDateTime,
    /// Model output before the diurnal adjustment.
    pub raw: f32,
    pub estimate: f32,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug)]
pub struct AppContext {
    config: AppConfig,
    artifacts: ArtifactCache,
    places: PlaceTable,
    rng: Mutex<ChaCha8Rng>,
}

impl AppContext {
    /// Loads the artifacts eagerly. A failure here is fatal for the caller.
    pub fn start(config: AppConfig) -> Result<Self, StartupError> {
        let ctx = Self::with_cache(config.clone(), ArtifactCache::new(config.artifacts.clone()));
        ctx.artifacts.get()?;
        info!(
            places = ctx.places.len(),
            noise = ?ctx.config.forecast.noise,
            days = ctx.config.forecast.days,
            "model ready for predictions"
        );
        Ok(ctx)
    }

    pub fn with_artifacts(config: AppConfig, artifacts: Artifacts) -> Self {
        Self::with_cache(config, ArtifactCache::preloaded(artifacts))
    }

    fn with_cache(config: AppConfig, artifacts: ArtifactCache) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        AppContext {
            config,
            artifacts,
            places: PlaceTable::bangkok(),
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn places(&self) -> &PlaceTable {
        &self.places
    }

    pub fn artifacts(&self) -> Result<Arc<Artifacts>, StartupError> {
        self.artifacts.get()
    }

    /// Runs `f` with the context's random source. It is seeded once from
    /// the config, so a seeded session is reproducible as a whole while
    /// successive calls still draw fresh values.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *rng)
    }

    pub fn resolve(&self, location: &LocationInput) -> Result<Coordinate, FormError> {
        match location {
            LocationInput::Manual {
                latitude,
                longitude,
            } => Ok(Coordinate::new(*latitude, *longitude)?),
            LocationInput::Place(name) => Ok(self.places.lookup(name)?),
        }
    }

    /// Raw prediction plus the diurnal adjustment, floored at zero.
    pub fn point_estimate<R: Rng + ?Sized>(
        &self,
        coordinate: Coordinate,
        timestamp: NaiveDateTime,
        rng: &mut R,
    ) -> Result<(f32, f32), FormError> {
        let artifacts = self.artifacts()?;
        let pipeline = InferencePipeline::new(&artifacts, self.config.time.utc_offset_seconds);
        let raw = pipeline.predict(coordinate, timestamp)?;
        let estimate = diurnal::adjust(raw, timestamp.hour(), rng);
        Ok((raw, estimate))
    }

    pub fn forecast<R: Rng + ?Sized>(
        &self,
        coordinate: Coordinate,
        start: NaiveDateTime,
        rng: &mut R,
    ) -> Result<Vec<ForecastPoint>, FormError> {
        let artifacts = self.artifacts()?;
        let pipeline = InferencePipeline::new(&artifacts, self.config.time.utc_offset_seconds);
        let settings = &self.config.forecast;
        let points = ForecastSeries::new(pipeline, coordinate, start.date(), settings.days, rng)
            .sample_hours(&settings.sample_hours)
            .noise(settings.noise)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Runs the whole form: resolve, parse, estimate, forecast.
    pub fn submit<R: Rng + ?Sized>(
        &self,
        form: &FormInput,
        rng: &mut R,
    ) -> Result<Submission, FormError> {
        let result = self.run_submission(form, rng);
        if let Err(e) = &result {
            warn!(error = %e, "submission rejected");
        }
        result
    }

    fn run_submission<R: Rng + ?Sized>(
        &self,
        form: &FormInput,
        rng: &mut R,
    ) -> Result<Submission, FormError> {
        let coordinate = self.resolve(&form.location)?;
        let timestamp = parse_timestamp(&form.timestamp)?;
        let (raw, estimate) = self.point_estimate(coordinate, timestamp, rng)?;
        let forecast = self.forecast(coordinate, timestamp, rng)?;
        Ok(Submission {
            coordinate,
            timestamp,
            raw,
            estimate,
            forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, ParseError};
    use crate::model::layers::Activation;
    use crate::model::network::{DenseLayer, RegressionNetwork};
    use crate::model::scaler::Scaler;
    use ndarray::{Array2, array};

    fn context() -> AppContext {
        let artifacts = Artifacts::new(
            RegressionNetwork {
                layers: vec![DenseLayer {
                    weights: Array2::zeros((3, 1)),
                    bias: array![[0.5]],
                    activation: Activation::Linear,
                }],
            },
            Scaler::standard(array![0.0, 0.0, 0.0], array![1.0, 1.0, 1.0]),
            Scaler::min_max(array![0.0], array![100.0]),
        )
        .unwrap();
        let config = AppConfig {
            seed: Some(11),
            ..AppConfig::default()
        };
        AppContext::with_artifacts(config, artifacts)
    }

    #[test]
    fn place_submission_resolves_and_forecasts() {
        let ctx = context();
        let form = FormInput {
            location: LocationInput::Place("สีลม".into()),
            timestamp: "2024-01-15 12:30:00".into(),
        };
        let out = ctx.with_rng(|rng| ctx.submit(&form, rng)).unwrap();
        assert_eq!(out.coordinate, Coordinate::new(13.73, 100.525).unwrap());
        assert!((out.raw - 50.0).abs() < 1e-4);
        assert!(out.estimate >= 49.0 && out.estimate <= 50.0);
        assert_eq!(out.forecast.len(), 30);
    }

    #[test]
    fn unknown_place_leaves_nothing_computed() {
        let ctx = context();
        let form = FormInput {
            location: LocationInput::Place("nowhere".into()),
            timestamp: "2024-01-15 12:30:00".into(),
        };
        let err = ctx.with_rng(|rng| ctx.submit(&form, rng)).unwrap_err();
        assert!(matches!(err, FormError::Lookup(LookupError::UnknownPlace { .. })));
        assert!(err.user_message().contains("nowhere"));
    }

    #[test]
    fn out_of_range_manual_entry_is_a_parse_error() {
        let ctx = context();
        let form = FormInput {
            location: LocationInput::Manual {
                latitude: 123.0,
                longitude: 0.0,
            },
            timestamp: "2024-01-15 12:30:00".into(),
        };
        let err = ctx.with_rng(|rng| ctx.submit(&form, rng)).unwrap_err();
        assert!(matches!(err, FormError::Parse(ParseError::CoordinateOutOfRange { .. })));
    }

    fn rush_hour_form() -> FormInput {
        FormInput {
            location: LocationInput::Manual {
                latitude: 13.7563,
                longitude: 100.5018,
            },
            timestamp: "2024-01-15 08:00:00".into(),
        }
    }

    #[test]
    fn seeded_contexts_repeat_themselves() {
        let (one, two) = (context(), context());
        let form = rush_hour_form();
        for _ in 0..3 {
            let a = one.with_rng(|rng| one.submit(&form, rng)).unwrap();
            let b = two.with_rng(|rng| two.submit(&form, rng)).unwrap();
            assert_eq!(a.estimate, b.estimate);
            assert_eq!(a.forecast, b.forecast);
        }
    }

    #[test]
    fn successive_submissions_draw_fresh_noise() {
        let ctx = context();
        let form = rush_hour_form();
        let a = ctx.with_rng(|rng| ctx.submit(&form, rng)).unwrap();
        let b = ctx.with_rng(|rng| ctx.submit(&form, rng)).unwrap();
        assert_eq!(a.raw, b.raw);
        assert_ne!(a.forecast, b.forecast);
    }

    #[test]
    fn manual_text_entry_is_validated() {
        let location = LocationInput::manual_from_text(" 13.75 ", "100.5").unwrap();
        assert_eq!(
            location,
            LocationInput::Manual {
                latitude: 13.75,
                longitude: 100.5,
            }
        );

        let err = LocationInput::manual_from_text("north", "100.5").unwrap_err();
        assert!(matches!(err, FormError::Parse(ParseError::InvalidNumber { .. })));
        assert!(err.user_message().contains("north"));

        let err = LocationInput::manual_from_text("91", "100.5").unwrap_err();
        assert!(matches!(err, FormError::Parse(ParseError::CoordinateOutOfRange { .. })));
    }
}
