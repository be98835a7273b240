use siamese_core::{Float, Tensor, TensorResult};

/// A stage of the feature extractor.
///
/// Layers borrow their parameters rather than own them, so every stage built from one
/// [`WeightSet`](crate::WeightSet) reads the same kernel values.
pub trait Layer<T: Float> {
    /// Forward pass.
    fn forward(&self, input: &Tensor<T>) -> TensorResult<Tensor<T>>;
    /// Human-readable stage name for logging.
    fn name(&self) -> &str;
}

/// ReLU activation layer: `max(0, x)`.
pub struct ReLULayer;

impl ReLULayer {
    pub fn new() -> Self { ReLULayer }
}

impl<T: Float> Layer<T> for ReLULayer {
    fn forward(&self, input: &Tensor<T>) -> TensorResult<Tensor<T>> { Ok(input.relu()) }
    fn name(&self) -> &str { "relu" }
}

impl Default for ReLULayer {
    fn default() -> Self { Self::new() }
}
