use siamese_core::{Float, Tensor};
use siamese_loss::{euclidean_distance, ContrastiveLoss};
use siamese_nn::{PairEncoder, SharedWeights, WeightSet};

use crate::config::SiameseConfig;
use crate::error::SiameseResult;
use crate::input::InputSpec;

/// Everything one forward pass produces.
#[derive(Debug, Clone)]
pub struct ForwardOutput<T: Float> {
    /// Features of the original batch: `[batch, height, width, 16]`.
    pub original_features: Tensor<T>,
    /// Features of the candidate batch: `[batch, height, width, 16]`.
    pub candidate_features: Tensor<T>,
    /// Per-location distance: `[batch, height, width]`.
    pub distance: Tensor<T>,
    /// Summed contrastive loss.
    pub loss: T,
}

/// Shared-weight feature extractor, distance metric and contrastive loss, wired together.
#[derive(Debug, Clone)]
pub struct SiameseNetwork<T: Float> {
    config: SiameseConfig,
    encoder: PairEncoder<T>,
    loss: ContrastiveLoss,
}

impl<T: Float> SiameseNetwork<T> {
    /// Network over freshly initialised (seeded) weights.
    pub fn new(config: SiameseConfig) -> SiameseResult<Self> {
        let weights = WeightSet::initialize()?.into_shared();
        Self::with_weights(config, weights)
    }

    /// Network over an existing weight handle; the handle is shared, not copied.
    pub fn with_weights(config: SiameseConfig, weights: SharedWeights<T>) -> SiameseResult<Self> {
        config.validate()?;
        Ok(SiameseNetwork {
            loss: ContrastiveLoss::with_margin(config.margin),
            encoder: PairEncoder::new(weights),
            config,
        })
    }

    pub fn config(&self) -> &SiameseConfig {
        &self.config
    }

    pub fn input_spec(&self) -> &InputSpec {
        &self.config.input
    }

    pub fn encoder(&self) -> &PairEncoder<T> {
        &self.encoder
    }

    pub fn weights(&self) -> &SharedWeights<T> {
        self.encoder.weights()
    }

    /// Distance map between the features of two image batches.
    pub fn distance(&self, original: &Tensor<T>, candidate: &Tensor<T>) -> SiameseResult<Tensor<T>> {
        self.input_spec().check_images(original)?;
        let (f_original, f_candidate) = self.encoder.encode_pair(original, candidate)?;
        Ok(euclidean_distance(&f_original, &f_candidate)?)
    }

    /// Full forward pass: encode both batches, measure distance, reduce to the loss.
    pub fn forward(
        &self,
        original: &Tensor<T>,
        candidate: &Tensor<T>,
        labels: &Tensor<T>,
    ) -> SiameseResult<ForwardOutput<T>> {
        let batch = self.input_spec().check_pair(original, candidate, labels)?;

        let (original_features, candidate_features) = self.encoder.encode_pair(original, candidate)?;
        let distance = euclidean_distance(&original_features, &candidate_features)?;
        let loss = self.loss.forward(labels, &distance)?;

        tracing::info!(batch, loss = %loss, "siamese forward pass");
        Ok(ForwardOutput {
            original_features,
            candidate_features,
            distance,
            loss,
        })
    }
}
