use siamese_core::{Float, Tensor, TensorError, TensorResult};

use crate::conv::Conv2D;
use crate::layers::{Layer, ReLULayer};
use crate::weights::{SharedWeights, WeightSet, INPUT_CHANNELS};

/// Reject anything that is not a `[batch, height, width, 3]` image batch.
///
/// Both a wrong rank and a wrong channel count fail with `ShapeMismatch`. The expected
/// shape keeps the leading dims of the input (missing ones read as 1) and ends in RGB.
pub fn check_image_batch<T: Float>(input: &Tensor<T>) -> TensorResult<()> {
    let dims = input.shape().dims();
    if dims.len() == 4 && dims[3] == INPUT_CHANNELS {
        return Ok(());
    }
    let mut expected: Vec<usize> = dims.iter().copied().take(3).collect();
    expected.resize(3, 1);
    expected.push(INPUT_CHANNELS);
    Err(TensorError::ShapeMismatch {
        expected,
        got: dims.to_vec(),
    })
}

/// Run the five conv + ReLU stages over `input` with `weights`.
///
/// Input shape:  [batch, height, width, 3]
/// Output shape: [batch, height, width, 16]
pub fn extract<T: Float>(input: &Tensor<T>, weights: &WeightSet<T>) -> TensorResult<Tensor<T>> {
    check_image_batch(input)?;
    let relu = ReLULayer::new();

    let mut features: Option<Tensor<T>> = None;
    for (spec, kernel) in weights.iter() {
        let current = features.as_ref().unwrap_or(input);
        let conv = Conv2D::new(spec.name, kernel);
        let activated = relu.forward(&conv.forward(current)?)?;
        tracing::debug!(
            layer = conv.name(),
            kernel = spec.kernel_size,
            out_shape = %activated.shape(),
            "conv + relu"
        );
        features = Some(activated);
    }
    features.ok_or(TensorError::EmptyTensor)
}

/// Feature extractor bound to a shared weight set.
#[derive(Debug, Clone)]
pub struct FeatureExtractor<T: Float> {
    weights: SharedWeights<T>,
}

impl<T: Float> FeatureExtractor<T> {
    pub fn new(weights: SharedWeights<T>) -> Self {
        FeatureExtractor { weights }
    }

    /// Extractor over freshly initialised (seeded) weights.
    pub fn initialized() -> TensorResult<Self> {
        Ok(Self::new(WeightSet::initialize()?.into_shared()))
    }

    pub fn weights(&self) -> &SharedWeights<T> {
        &self.weights
    }

    pub fn extract(&self, input: &Tensor<T>) -> TensorResult<Tensor<T>> {
        extract(input, &self.weights)
    }
}

impl<T: Float> Layer<T> for FeatureExtractor<T> {
    fn forward(&self, input: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.extract(input)
    }

    fn name(&self) -> &str {
        "feature_extractor"
    }
}
