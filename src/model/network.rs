use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InferenceError;
use crate::model::layers::Activation;

#[derive(Serialize, Deserialize, Clone)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub bias: Array2<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }
}

/// Feed-forward regression network. Rows in, one prediction row out.
#[derive(Serialize, Deserialize, Clone)]
pub struct RegressionNetwork {
    pub layers: Vec<DenseLayer>,
}

impl fmt::Debug for RegressionNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shapes: Vec<_> = self
            .layers
            .iter()
            .map(|l| (l.input_size(), l.output_size(), l.activation))
            .collect();
        write!(f, "RegressionNetwork {{ layers: {:?} }}", shapes)
    }
}

impl RegressionNetwork {
    pub fn input_size(&self) -> Option<usize> {
        self.layers.first().map(DenseLayer::input_size)
    }

    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(DenseLayer::output_size)
    }

    /// Checks that consecutive layers agree on their widths and that every
    /// bias is a single row matching its layer.
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("network has no layers".to_string());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.bias.dim() != (1, layer.output_size()) {
                return Err(format!(
                    "layer {i}: bias shape {:?} does not match {} outputs",
                    layer.bias.dim(),
                    layer.output_size()
                ));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].output_size(),
                    i + 1,
                    pair[1].input_size()
                ));
            }
        }
        Ok(())
    }

    pub fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>, InferenceError> {
        let mut output = x.to_owned();
        for layer in &self.layers {
            if output.ncols() != layer.input_size() {
                return Err(InferenceError::ShapeMismatch {
                    stage: "model",
                    expected: layer.input_size(),
                    actual: output.ncols(),
                });
            }
            let z = output.dot(&layer.weights) + &layer.bias;
            output = layer.activation.apply(z);
        }
        Ok(output)
    }
}

#[cfg(test)]
impl RegressionNetwork {
    /// He-uniform initialised network with relu hidden layers and a linear
    /// output layer. Fixture for tests that only care about shapes.
    pub(crate) fn random(input_size: usize, hidden_sizes: &[usize], output_size: usize) -> Self {
        use ndarray_rand::RandomExt;
        use ndarray_rand::rand_distr::Uniform;

        let he_init = |size: usize| (2.0 / size as f32).sqrt();

        let mut sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        sizes.push(input_size);
        sizes.extend_from_slice(hidden_sizes);
        sizes.push(output_size);

        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let (fan_in, fan_out) = (pair[0], pair[1]);
                let limit = he_init(fan_in);
                DenseLayer {
                    weights: Array2::random((fan_in, fan_out), Uniform::new(-limit, limit)),
                    bias: Array2::zeros((1, fan_out)),
                    activation: if i == last {
                        Activation::Linear
                    } else {
                        Activation::Relu
                    },
                }
            })
            .collect();

        RegressionNetwork { layers }
    }
}
