use siamese_core::{Float, Tensor, TensorError, TensorResult};

/// Fan-in and fan-out of a `[kernel_h, kernel_w, in_channels, out_channels]` kernel.
///
/// The receptive field multiplies both: fan_in = kh·kw·in, fan_out = kh·kw·out.
pub fn conv_fans(shape: [usize; 4]) -> (usize, usize) {
    let [kh, kw, in_ch, out_ch] = shape;
    let receptive = kh * kw;
    (receptive * in_ch, receptive * out_ch)
}

/// Half-width of the Glorot/Xavier uniform range: `sqrt(6 / (fan_in + fan_out))`.
pub fn glorot_limit(fan_in: usize, fan_out: usize) -> f64 {
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

/// Glorot/Xavier-uniform convolution kernel, drawn from `[-limit, limit)`.
///
/// The draw is fully determined by `seed`.
pub fn glorot_uniform<T: Float>(shape: [usize; 4], seed: u64) -> TensorResult<Tensor<T>> {
    let (fan_in, fan_out) = conv_fans(shape);
    if fan_in + fan_out == 0 {
        return Err(TensorError::InvalidOperation(format!(
            "cannot initialise an empty kernel of shape {:?}",
            shape
        )));
    }
    let limit = glorot_limit(fan_in, fan_out);
    let unit = Tensor::<f64>::rand(shape.to_vec(), Some(seed));
    let data = unit
        .data()
        .iter()
        .map(|&u| T::from_f64((2.0 * u - 1.0) * limit))
        .collect();
    Tensor::new(data, shape.to_vec())
}
