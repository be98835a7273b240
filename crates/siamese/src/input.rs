use serde::{Deserialize, Serialize};
use siamese_core::{Float, Shape, Tensor, TensorResult};
use siamese_nn::INPUT_CHANNELS;

/// Declared input slots of the network: two image batches and one label map.
///
/// Spatial size and channel count are fixed per network; batch size is left open and
/// read from the tensors at each call.
///
/// | slot      | shape                              |
/// |-----------|------------------------------------|
/// | original  | `[batch, height, width, channels]` |
/// | candidate | `[batch, height, width, channels]` |
/// | labels    | `[batch, height, width]`           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub height: usize,
    pub width: usize,
    #[serde(default = "default_channels")]
    pub channels: usize,
}

fn default_channels() -> usize {
    INPUT_CHANNELS
}

impl InputSpec {
    pub fn new(height: usize, width: usize) -> Self {
        InputSpec {
            height,
            width,
            channels: INPUT_CHANNELS,
        }
    }

    pub fn image_shape(&self, batch: usize) -> Vec<usize> {
        vec![batch, self.height, self.width, self.channels]
    }

    pub fn label_shape(&self, batch: usize) -> Vec<usize> {
        vec![batch, self.height, self.width]
    }

    /// Check an image batch against the declared slot; returns its batch size.
    ///
    /// Any deviation, rank included, is a `ShapeMismatch` against `image_shape(batch)`.
    pub fn check_images<T: Float>(&self, images: &Tensor<T>) -> TensorResult<usize> {
        let batch = images.shape().dims().first().copied().unwrap_or(0);
        Shape::new(self.image_shape(batch)).ensure_eq(images.shape())?;
        Ok(batch)
    }

    /// Check a full `(original, candidate, labels)` triple; returns the shared batch size.
    pub fn check_pair<T: Float>(
        &self,
        original: &Tensor<T>,
        candidate: &Tensor<T>,
        labels: &Tensor<T>,
    ) -> TensorResult<usize> {
        let batch = self.check_images(original)?;
        original.shape().ensure_eq(candidate.shape())?;
        Shape::new(self.label_shape(batch)).ensure_eq(labels.shape())?;
        Ok(batch)
    }
}

impl Default for InputSpec {
    fn default() -> Self {
        InputSpec::new(1, 1)
    }
}
