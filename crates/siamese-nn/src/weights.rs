use std::sync::Arc;

use siamese_core::{Float, Tensor, TensorError, TensorResult};

use crate::init::{conv_fans, glorot_limit, glorot_uniform};

/// Channels of every input image (RGB).
pub const INPUT_CHANNELS: usize = 3;

/// Depth of the extracted feature maps.
pub const FEATURE_CHANNELS: usize = 16;

/// Static description of one convolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub name: &'static str,
    pub kernel_size: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub seed: u64,
}

impl LayerSpec {
    /// Kernel layout: `[kernel_h, kernel_w, in_channels, out_channels]`.
    pub const fn kernel_shape(&self) -> [usize; 4] {
        [self.kernel_size, self.kernel_size, self.in_channels, self.out_channels]
    }
}

/// The five convolution stages, in application order.
pub static SIAMESE_LAYERS: [LayerSpec; 5] = [
    LayerSpec { name: "w1", kernel_size: 3, in_channels: INPUT_CHANNELS, out_channels: 64, seed: 0 },
    LayerSpec { name: "w2", kernel_size: 3, in_channels: 64, out_channels: 64, seed: 1 },
    LayerSpec { name: "w3", kernel_size: 5, in_channels: 64, out_channels: 64, seed: 2 },
    LayerSpec { name: "w4", kernel_size: 5, in_channels: 64, out_channels: 32, seed: 3 },
    LayerSpec { name: "w5", kernel_size: 1, in_channels: 32, out_channels: FEATURE_CHANNELS, seed: 4 },
];

/// Read-only handle to a weight set, shared by both branches of a pair encoder.
pub type SharedWeights<T> = Arc<WeightSet<T>>;

/// The five named convolution kernels of the feature extractor.
///
/// Kernels are fixed at construction: there is no mutable access, so a `WeightSet`
/// behind an `Arc` can be read concurrently by any number of forward passes.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet<T: Float> {
    kernels: Vec<Tensor<T>>,
}

impl<T: Float> WeightSet<T> {
    /// Glorot-uniform initialisation, one fixed seed per layer.
    ///
    /// Calling this twice yields bit-identical kernels.
    pub fn initialize() -> TensorResult<Self> {
        let mut kernels = Vec::with_capacity(SIAMESE_LAYERS.len());
        for spec in SIAMESE_LAYERS.iter() {
            let shape = spec.kernel_shape();
            let (fan_in, fan_out) = conv_fans(shape);
            tracing::debug!(
                layer = spec.name,
                seed = spec.seed,
                shape = ?shape,
                limit = glorot_limit(fan_in, fan_out),
                "initialising kernel"
            );
            kernels.push(glorot_uniform(shape, spec.seed)?);
        }
        Ok(WeightSet { kernels })
    }

    /// Build a weight set from caller-supplied kernels, in layer order `w1..w5`.
    ///
    /// Each kernel must have exactly the shape its layer declares; this enforces the
    /// channel chain (layer i's output depth is layer i+1's input depth, layer 1 reads
    /// RGB, layer 5 writes the feature depth).
    pub fn from_kernels(kernels: Vec<Tensor<T>>) -> TensorResult<Self> {
        if kernels.len() != SIAMESE_LAYERS.len() {
            return Err(TensorError::InvalidOperation(format!(
                "expected {} kernels, got {}",
                SIAMESE_LAYERS.len(),
                kernels.len()
            )));
        }
        for (spec, kernel) in SIAMESE_LAYERS.iter().zip(kernels.iter()) {
            let expected = spec.kernel_shape();
            if kernel.shape().dims() != &expected[..] {
                return Err(TensorError::ShapeMismatch {
                    expected: expected.to_vec(),
                    got: kernel.shape_vec(),
                });
            }
        }
        Ok(WeightSet { kernels })
    }

    /// Wrap in a shared, read-only handle.
    pub fn into_shared(self) -> SharedWeights<T> {
        Arc::new(self)
    }

    /// Kernel by layer name (`"w1"`..`"w5"`).
    pub fn get(&self, name: &str) -> Option<&Tensor<T>> {
        SIAMESE_LAYERS
            .iter()
            .position(|spec| spec.name == name)
            .map(|i| &self.kernels[i])
    }

    /// `(layer, kernel)` pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&LayerSpec, &Tensor<T>)> {
        SIAMESE_LAYERS.iter().zip(self.kernels.iter())
    }

    pub fn into_kernels(self) -> Vec<Tensor<T>> {
        self.kernels
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.kernels.iter().map(|k| k.numel()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_chain() {
        assert_eq!(SIAMESE_LAYERS[0].in_channels, INPUT_CHANNELS);
        assert_eq!(SIAMESE_LAYERS[4].out_channels, FEATURE_CHANNELS);
        for pair in SIAMESE_LAYERS.windows(2) {
            assert_eq!(pair[0].out_channels, pair[1].in_channels);
        }
        let seeds: Vec<u64> = SIAMESE_LAYERS.iter().map(|s| s.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_initialize_shapes() {
        let w: WeightSet<f32> = WeightSet::initialize().unwrap();
        assert_eq!(w.len(), 5);
        assert!(!w.is_empty());
        assert_eq!(w.get("w1").unwrap().shape_vec(), vec![3, 3, 3, 64]);
        assert_eq!(w.get("w2").unwrap().shape_vec(), vec![3, 3, 64, 64]);
        assert_eq!(w.get("w3").unwrap().shape_vec(), vec![5, 5, 64, 64]);
        assert_eq!(w.get("w4").unwrap().shape_vec(), vec![5, 5, 64, 32]);
        assert_eq!(w.get("w5").unwrap().shape_vec(), vec![1, 1, 32, 16]);
        assert!(w.get("w6").is_none());
        assert_eq!(
            w.num_parameters(),
            1728 + 36864 + 102400 + 51200 + 512
        );
    }

    #[test]
    fn test_initialize_is_deterministic() {
        let a: WeightSet<f32> = WeightSet::initialize().unwrap();
        let b: WeightSet<f32> = WeightSet::initialize().unwrap();
        assert_eq!(a, b);
        // Each layer has its own seed, so no two layers start from the same draw.
        assert_ne!(a.get("w2").unwrap().data()[..64], b.get("w3").unwrap().data()[..64]);
    }

    #[test]
    fn test_from_kernels_roundtrip() {
        let w: WeightSet<f64> = WeightSet::initialize().unwrap();
        let rebuilt = WeightSet::from_kernels(w.clone().into_kernels()).unwrap();
        assert_eq!(w, rebuilt);
    }

    #[test]
    fn test_from_kernels_broken_chain() {
        let mut kernels = WeightSet::<f32>::initialize().unwrap().into_kernels();
        kernels[3] = Tensor::zeros(vec![5, 5, 64, 48]);
        let err = WeightSet::from_kernels(kernels).unwrap_err();
        assert_eq!(
            err,
            TensorError::ShapeMismatch {
                expected: vec![5, 5, 64, 32],
                got: vec![5, 5, 64, 48],
            }
        );
    }

    #[test]
    fn test_from_kernels_wrong_input_depth() {
        let mut kernels = WeightSet::<f32>::initialize().unwrap().into_kernels();
        kernels[0] = Tensor::zeros(vec![3, 3, 1, 64]);
        assert!(matches!(
            WeightSet::from_kernels(kernels),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_from_kernels_wrong_count() {
        let mut kernels = WeightSet::<f32>::initialize().unwrap().into_kernels();
        kernels.pop();
        assert!(WeightSet::from_kernels(kernels).is_err());
    }
}
