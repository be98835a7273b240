use std::sync::Arc;

use siamese_core::{Float, Tensor, TensorResult};

use crate::extractor::{extract, FeatureExtractor};
use crate::weights::{SharedWeights, WeightSet};

/// Encode an (original, candidate) pair with one weight set.
///
/// Both inputs must have the same `[batch, height, width, 3]` shape. The two branches
/// run independently (in parallel) but read the very same kernels.
pub fn encode_pair<T: Float>(
    original: &Tensor<T>,
    candidate: &Tensor<T>,
    weights: &WeightSet<T>,
) -> TensorResult<(Tensor<T>, Tensor<T>)> {
    original.shape().ensure_eq(candidate.shape())?;
    let (f_original, f_candidate) = rayon::join(
        || extract(original, weights),
        || extract(candidate, weights),
    );
    Ok((f_original?, f_candidate?))
}

/// The two branches of a Siamese network, sharing one weight handle.
#[derive(Debug, Clone)]
pub struct PairEncoder<T: Float> {
    extractor: FeatureExtractor<T>,
}

impl<T: Float> PairEncoder<T> {
    pub fn new(weights: SharedWeights<T>) -> Self {
        PairEncoder {
            extractor: FeatureExtractor::new(weights),
        }
    }

    /// Encoder over freshly initialised (seeded) weights.
    pub fn initialized() -> TensorResult<Self> {
        Ok(PairEncoder {
            extractor: FeatureExtractor::initialized()?,
        })
    }

    pub fn weights(&self) -> &SharedWeights<T> {
        self.extractor.weights()
    }

    /// True when `other` reads exactly the same weight set (not merely equal values).
    pub fn shares_weights_with(&self, other: &SharedWeights<T>) -> bool {
        Arc::ptr_eq(self.weights(), other)
    }

    pub fn encode_pair(
        &self,
        original: &Tensor<T>,
        candidate: &Tensor<T>,
    ) -> TensorResult<(Tensor<T>, Tensor<T>)> {
        encode_pair(original, candidate, self.weights())
    }
}
