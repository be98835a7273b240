use siamese_core::{Float, Tensor, TensorResult};

/// Channel axis of a `[batch, height, width, channels]` feature map.
pub const CHANNEL_AXIS: usize = 3;

/// Per-location Euclidean distance between two feature maps.
///
/// Input shapes:  [batch, height, width, channels] (identical)
/// Output shape:  [batch, height, width]
///
/// D[b, h, w] = ||F1[b, h, w, :] - F2[b, h, w, :]||₂, never negative.
pub fn euclidean_distance<T: Float>(f1: &Tensor<T>, f2: &Tensor<T>) -> TensorResult<Tensor<T>> {
    f1.shape().ensure_eq(f2.shape())?;
    f1.shape().ensure_ndim(4)?;
    let diff = f1.sub(f2)?;
    let distance = diff.norm_axis(CHANNEL_AXIS)?;
    tracing::trace!(shape = %distance.shape(), "euclidean distance");
    Ok(distance)
}
