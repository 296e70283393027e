use chrono::NaiveDateTime;
use tracing::debug;

use crate::data::preprocessing::{Coordinate, FeatureVector, parse_timestamp};
use crate::error::{FormError, InferenceError};
use crate::model::artifacts::Artifacts;

/// Raw model inference: features in, PM2.5 in µg/m³ out. No randomness.
#[derive(Debug, Clone, Copy)]
pub struct InferencePipeline<'a> {
    artifacts: &'a Artifacts,
    utc_offset_seconds: i32,
}

impl<'a> InferencePipeline<'a> {
    pub fn new(artifacts: &'a Artifacts, utc_offset_seconds: i32) -> Self {
        InferencePipeline {
            artifacts,
            utc_offset_seconds,
        }
    }

    pub fn features(
        &self,
        coordinate: Coordinate,
        timestamp: NaiveDateTime,
    ) -> Result<FeatureVector, InferenceError> {
        FeatureVector::new(coordinate, timestamp, self.utc_offset_seconds)
    }

    pub fn predict(
        &self,
        coordinate: Coordinate,
        timestamp: NaiveDateTime,
    ) -> Result<f32, InferenceError> {
        let features = self.features(coordinate, timestamp)?;
        let input = features.to_row()?;
        debug!(?features, "raw input");

        let scaled = self.artifacts.input_scaler.forward(&input)?;
        debug!(scaled = ?scaled.row(0).to_vec(), "normalized input");

        let output = self.artifacts.model.forward(&scaled)?;
        let prediction = self.artifacts.output_scaler.inverse(&output)?;

        let value = prediction
            .iter()
            .next()
            .copied()
            .ok_or(InferenceError::ShapeMismatch {
                stage: "model output",
                expected: 1,
                actual: 0,
            })?;
        if !value.is_finite() {
            return Err(InferenceError::NonFinite);
        }
        debug!(value, "network output");
        Ok(value)
    }

    /// Parses the timestamp text first; a malformed timestamp never reaches
    /// the model.
    pub fn predict_text(&self, coordinate: Coordinate, timestamp: &str) -> Result<f32, FormError> {
        let timestamp = parse_timestamp(timestamp)?;
        Ok(self.predict(coordinate, timestamp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layers::Activation;
    use crate::model::network::{DenseLayer, RegressionNetwork};
    use crate::model::scaler::Scaler;
    use ndarray::{Array2, array};

    fn broken_artifacts() -> Artifacts {
        // Deliberately bypasses validation: any forward pass fails.
        Artifacts {
            model: RegressionNetwork {
                layers: vec![DenseLayer {
                    weights: Array2::zeros((4, 1)),
                    bias: Array2::zeros((1, 1)),
                    activation: Activation::Linear,
                }],
            },
            input_scaler: Scaler::standard(array![0.0, 0.0, 0.0], array![1.0, 1.0, 1.0]),
            output_scaler: Scaler::standard(array![0.0], array![1.0]),
        }
    }

    #[test]
    fn shape_mismatch_surfaces_as_inference_error() {
        let artifacts = broken_artifacts();
        let pipeline = InferencePipeline::new(&artifacts, 0);
        let coordinate = Coordinate::new(0.0, 0.0).unwrap();
        let err = pipeline
            .predict_text(coordinate, "2024-01-15 08:00:00")
            .unwrap_err();
        assert!(matches!(err, FormError::Inference(InferenceError::ShapeMismatch { .. })));
    }

    #[test]
    fn bad_timestamp_fails_before_the_model() {
        let artifacts = broken_artifacts();
        let pipeline = InferencePipeline::new(&artifacts, 0);
        let coordinate = Coordinate::new(0.0, 0.0).unwrap();
        let err = pipeline.predict_text(coordinate, "15-01-2024").unwrap_err();
        assert!(matches!(err, FormError::Parse(_)));
    }

    #[test]
    fn non_finite_output_is_rejected() {
        let mut artifacts = broken_artifacts();
        artifacts.model.layers[0].weights = Array2::zeros((3, 1));
        artifacts.output_scaler = Scaler::standard(array![f32::INFINITY], array![1.0]);
        let pipeline = InferencePipeline::new(&artifacts, 0);
        let coordinate = Coordinate::new(0.0, 0.0).unwrap();
        let err = pipeline
            .predict_text(coordinate, "2024-01-15 08:00:00")
            .unwrap_err();
        assert!(matches!(err, FormError::Inference(InferenceError::NonFinite)));
    }
}
