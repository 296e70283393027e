//! Fitted feature/target transforms.
//!
//! A scaler is fitted offline together with the model and shipped as an
//! artifact. Here it is only applied, never refitted.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Scaler {
    /// `(x - data_min) / (data_max - data_min)` mapped onto `feature_range`.
    MinMax {
        data_min: Array1<f32>,
        data_max: Array1<f32>,
        feature_range: (f32, f32),
    },
    /// `(x - mean) / scale`.
    Standard { mean: Array1<f32>, scale: Array1<f32> },
}

impl Scaler {
    pub fn min_max(data_min: Array1<f32>, data_max: Array1<f32>) -> Self {
        Scaler::MinMax {
            data_min,
            data_max,
            feature_range: (0.0, 1.0),
        }
    }

    pub fn standard(mean: Array1<f32>, scale: Array1<f32>) -> Self {
        Scaler::Standard { mean, scale }
    }

    /// Number of columns this scaler was fitted on.
    pub fn width(&self) -> usize {
        match self {
            Scaler::MinMax { data_min, .. } => data_min.len(),
            Scaler::Standard { mean, .. } => mean.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                if data_min.len() != data_max.len() {
                    return Err(format!(
                        "data_min has {} columns, data_max has {}",
                        data_min.len(),
                        data_max.len()
                    ));
                }
                if !(lo < hi) {
                    return Err(format!("feature range ({lo}, {hi}) is empty"));
                }
            }
            Scaler::Standard { mean, scale } => {
                if mean.len() != scale.len() {
                    return Err(format!(
                        "mean has {} columns, scale has {}",
                        mean.len(),
                        scale.len()
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn forward(&self, rows: &Array2<f32>) -> Result<Array2<f32>, InferenceError> {
        self.check_width(rows, "scaler forward")?;
        let (offset, factor, shift) = self.coefficients();
        Ok((rows - &offset.insert_axis(Axis(0))) * &factor.insert_axis(Axis(0)) + shift)
    }

    pub fn inverse(&self, rows: &Array2<f32>) -> Result<Array2<f32>, InferenceError> {
        self.check_width(rows, "scaler inverse")?;
        let (offset, factor, shift) = self.coefficients();
        Ok((rows - shift) / &factor.insert_axis(Axis(0)) + &offset.insert_axis(Axis(0)))
    }

    /// Expresses both variants as `(x - offset) * factor + shift`.
    fn coefficients(&self) -> (Array1<f32>, Array1<f32>, f32) {
        match self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                let range = (data_max - data_min).mapv(non_zero);
                let factor = range.mapv(|r| (hi - lo) / r);
                (data_min.clone(), factor, *lo)
            }
            Scaler::Standard { mean, scale } => {
                (mean.clone(), scale.mapv(|s| 1.0 / non_zero(s)), 0.0)
            }
        }
    }

    fn check_width(&self, rows: &Array2<f32>, stage: &'static str) -> Result<(), InferenceError> {
        if rows.ncols() != self.width() {
            return Err(InferenceError::ShapeMismatch {
                stage,
                expected: self.width(),
                actual: rows.ncols(),
            });
        }
        Ok(())
    }
}

// Constant columns scale by one instead of dividing by zero.
fn non_zero(v: f32) -> f32 {
    if v == 0.0 { 1.0 } else { v }
}
