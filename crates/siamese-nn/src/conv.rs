use rayon::prelude::*;
use siamese_core::{Float, Tensor, TensorError, TensorResult};

use super::layers::Layer;

/// Padding before the first row/column so that a stride-1 convolution keeps the spatial size.
///
/// For odd `k` this is `(k - 1) / 2` on each side; for even `k` the extra cell goes after.
pub fn same_padding(kernel: usize) -> usize {
    kernel.saturating_sub(1) / 2
}

/// 2D convolution, stride 1, zero "same" padding, no bias.
///
/// Input shape:  [batch, height, width, in_channels]
/// Kernel shape: [kernel_h, kernel_w, in_channels, out_channels]
/// Output shape: [batch, height, width, out_channels]
///
/// Output rows are computed in parallel. Each output element is accumulated in a fixed
/// order (kernel row, kernel column, input channel), so the result does not depend on
/// how rows are scheduled.
pub fn conv2d_same<T: Float>(input: &Tensor<T>, kernel: &Tensor<T>) -> TensorResult<Tensor<T>> {
    input.shape().ensure_ndim(4)?;
    kernel.shape().ensure_ndim(4)?;

    let shape = input.shape_vec();
    let (batch, h, w, in_ch) = (shape[0], shape[1], shape[2], shape[3]);
    let k_shape = kernel.shape_vec();
    let (kh, kw, k_in, out_ch) = (k_shape[0], k_shape[1], k_shape[2], k_shape[3]);

    if k_in != in_ch {
        return Err(TensorError::ShapeMismatch {
            expected: vec![kh, kw, in_ch, out_ch],
            got: k_shape,
        });
    }
    if kh == 0 || kw == 0 {
        return Err(TensorError::InvalidOperation(format!(
            "convolution kernel must be at least 1x1, got {}x{}",
            kh, kw
        )));
    }

    let pad_top = same_padding(kh);
    let pad_left = same_padding(kw);
    let x = input.data();
    let k = kernel.data();

    let mut output = vec![T::ZERO; batch * h * w * out_ch];
    let row_len = w * out_ch;
    if row_len == 0 {
        return Tensor::new(output, vec![batch, h, w, out_ch]);
    }

    output
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, out_row)| {
            let b = row / h;
            let oh = row % h;
            for ow in 0..w {
                let acc = &mut out_row[ow * out_ch..(ow + 1) * out_ch];
                for ki in 0..kh {
                    // Rows falling in the zero padding contribute nothing.
                    let ih = match (oh + ki).checked_sub(pad_top) {
                        Some(ih) if ih < h => ih,
                        _ => continue,
                    };
                    for kj in 0..kw {
                        let iw = match (ow + kj).checked_sub(pad_left) {
                            Some(iw) if iw < w => iw,
                            _ => continue,
                        };
                        let x_off = ((b * h + ih) * w + iw) * in_ch;
                        let k_off = (ki * kw + kj) * in_ch * out_ch;
                        for ic in 0..in_ch {
                            let x_val = x[x_off + ic];
                            let k_row = &k[k_off + ic * out_ch..k_off + (ic + 1) * out_ch];
                            for (a, &w_val) in acc.iter_mut().zip(k_row) {
                                *a += x_val * w_val;
                            }
                        }
                    }
                }
            }
        });

    Tensor::new(output, vec![batch, h, w, out_ch])
}

/// 2D convolution layer over a borrowed kernel.
///
/// Input shape:  [batch, height, width, in_channels]
/// Output shape: [batch, height, width, out_channels]
pub struct Conv2D<'w, T: Float> {
    pub name: &'w str,
    pub kernel: &'w Tensor<T>,
}

impl<'w, T: Float> Conv2D<'w, T> {
    pub fn new(name: &'w str, kernel: &'w Tensor<T>) -> Self {
        Conv2D { name, kernel }
    }
}

impl<T: Float> Layer<T> for Conv2D<'_, T> {
    fn forward(&self, input: &Tensor<T>) -> TensorResult<Tensor<T>> {
        conv2d_same(input, self.kernel)
    }

    fn name(&self) -> &str {
        self.name
    }
}
