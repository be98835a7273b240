//! # Siamese contrastive network
//!
//! A shared-weight convolutional feature extractor applied to two image batches, a
//! per-pixel Euclidean distance between the resulting feature maps, and a margin-based
//! contrastive loss driven by a binary label map.
//!
//! ## Crates
//!
//! - **core**: Tensor engine: row-major N-d arrays, element-wise ops, axis reductions
//! - **nn**: Same-padding convolution, Glorot init, the five-layer `WeightSet`, `FeatureExtractor`, `PairEncoder`
//! - **loss**: `euclidean_distance`, similar/dissimilar sub-losses, `ContrastiveLoss`
//!
//! ## Example
//!
//! ```
//! use siamese::{SiameseConfig, SiameseNetwork, Tensor};
//!
//! let net: SiameseNetwork<f32> = SiameseNetwork::new(SiameseConfig::new(4, 4)).unwrap();
//! let original = Tensor::rand(vec![2, 4, 4, 3], Some(0));
//! let candidate = Tensor::rand(vec![2, 4, 4, 3], Some(1));
//! let labels = Tensor::zeros(vec![2, 4, 4]);
//!
//! let out = net.forward(&original, &candidate, &labels).unwrap();
//! assert_eq!(out.distance.shape_vec(), vec![2, 4, 4]);
//! assert!(out.loss >= 0.0);
//! ```
//!
//! Label 0 marks a similar location (quadratic penalty on distance), label 1 a dissimilar
//! one (hinge on squared distance). Confirm this convention against your label data.

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod network;

/// Core tensor engine.
pub use siamese_core as core;

/// Feature extractor and weights.
pub use siamese_nn as nn;

/// Distance metric and contrastive loss.
pub use siamese_loss as loss;

pub use config::SiameseConfig;
pub use error::{SiameseError, SiameseResult};
pub use input::InputSpec;
pub use logging::init_tracing;
pub use network::{ForwardOutput, SiameseNetwork};
pub use siamese_core::{Float, Tensor, TensorError, TensorResult};
pub use siamese_loss::{contrastive_loss, euclidean_distance, ContrastiveLoss};
pub use siamese_nn::{encode_pair, extract, FeatureExtractor, PairEncoder, SharedWeights, WeightSet};
