use siamese_core::{Float, Tensor, TensorError, TensorResult};

/// Margin of the dissimilar-pair hinge, in squared-distance units.
pub const DEFAULT_MARGIN: f64 = 1.0;

/// Loss for a pair labelled similar (label 0): `0.5 * d²`.
pub fn similar_term<T: Float>(d: T) -> T {
    T::HALF * d * d
}

/// Loss for a pair labelled dissimilar (label 1): `0.5 * max(0, margin - d²)`.
///
/// A NaN distance yields a NaN loss.
pub fn dissimilar_term<T: Float>(d: T, margin: T) -> T {
    let hinge = margin - d * d;
    T::HALF * if hinge < T::ZERO { T::ZERO } else { hinge }
}

/// Element-wise similar-pair loss map over a distance map.
pub fn similar_loss<T: Float>(distance: &Tensor<T>) -> Tensor<T> {
    distance.apply(similar_term)
}

/// Element-wise dissimilar-pair loss map over a distance map, with the default margin.
pub fn dissimilar_loss<T: Float>(distance: &Tensor<T>) -> Tensor<T> {
    let margin = T::from_f64(DEFAULT_MARGIN);
    distance.apply(|d| dissimilar_term(d, margin))
}

/// Every label must be exactly 0 or 1.
pub fn validate_labels<T: Float>(labels: &Tensor<T>) -> TensorResult<()> {
    match labels
        .data()
        .iter()
        .position(|&y| y != T::ZERO && y != T::ONE)
    {
        Some(index) => Err(TensorError::InvalidLabelValue {
            index,
            value: labels.data()[index].to_f64(),
        }),
        None => Ok(()),
    }
}

/// Contrastive loss with the default margin:
///
/// L = Σ (1 - Y) · 0.5·D² + Y · 0.5·max(0, 1 - D²)
///
/// summed (not averaged) over batch and spatial positions.
pub fn contrastive_loss<T: Float>(labels: &Tensor<T>, distance: &Tensor<T>) -> TensorResult<T> {
    ContrastiveLoss::new().forward(labels, distance)
}

/// Margin-based contrastive loss over a distance map and a binary label map.
///
/// Label 0 selects the quadratic (similar) term, label 1 the hinge (dissimilar) term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastiveLoss {
    pub margin: f64,
}

impl ContrastiveLoss {
    pub fn new() -> Self {
        ContrastiveLoss {
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn with_margin(margin: f64) -> Self {
        ContrastiveLoss { margin }
    }

    /// Per-location loss `(1 - Y) · L_similar(D) + Y · L_dissimilar(D)`, before summation.
    pub fn per_element<T: Float>(
        &self,
        labels: &Tensor<T>,
        distance: &Tensor<T>,
    ) -> TensorResult<Tensor<T>> {
        distance.shape().ensure_eq(labels.shape())?;
        validate_labels(labels)?;

        let margin = T::from_f64(self.margin);
        labels.zip_with(distance, |y, d| {
            (T::ONE - y) * similar_term(d) + y * dissimilar_term(d, margin)
        })
    }

    /// Scalar loss: the per-element loss summed over every position.
    pub fn forward<T: Float>(&self, labels: &Tensor<T>, distance: &Tensor<T>) -> TensorResult<T> {
        let loss = self.per_element(labels, distance)?.sum_all();
        tracing::trace!(margin = self.margin, elements = distance.numel(), loss = %loss, "contrastive loss");
        Ok(loss)
    }
}

impl Default for ContrastiveLoss {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map(values: &[f64]) -> Tensor<f64> {
        Tensor::new(values.to_vec(), vec![1, 1, values.len()]).unwrap()
    }

    #[test]
    fn test_sub_losses_at_zero() {
        assert_eq!(similar_term(0.0f64), 0.0);
        assert_eq!(dissimilar_term(0.0f64, 1.0), 0.5);
    }

    #[test]
    fn test_margin_saturation() {
        for &d in &[1.0f64, 1.0001, 2.0, 5.0, 1e6] {
            assert_eq!(dissimilar_term(d, 1.0), 0.0, "d = {}", d);
        }
        assert_relative_eq!(dissimilar_term(0.5f64, 1.0), 0.375);
    }

    #[test]
    fn test_nan_distance_is_not_masked() {
        assert!(dissimilar_term(f64::NAN, 1.0).is_nan());
        assert!(dissimilar_loss(&map(&[0.0, f64::NAN])).has_nan());
        let loss = contrastive_loss(&map(&[1.0, 0.0]), &map(&[f64::NAN, 0.5])).unwrap();
        assert!(loss.is_nan());
    }

    #[test]
    fn test_sub_loss_maps() {
        let d = map(&[0.0, 0.5, 2.0]);
        assert_eq!(similar_loss(&d).data(), &[0.0, 0.125, 2.0]);
        assert_eq!(dissimilar_loss(&d).data(), &[0.5, 0.375, 0.0]);
    }

    #[test]
    fn test_worked_example() {
        // F1 = [3, 4], F2 = [0, 0] gives D = 5.
        let d = map(&[5.0]);
        assert_relative_eq!(contrastive_loss(&map(&[0.0]), &d).unwrap(), 12.5);
        assert_relative_eq!(contrastive_loss(&map(&[1.0]), &d).unwrap(), 0.0);
    }

    #[test]
    fn test_sum_not_mean() {
        let d = map(&[1.0, 2.0, 0.0, 0.5]);
        let y = map(&[0.0, 0.0, 1.0, 1.0]);
        // 0.5 + 2.0 + 0.5 + 0.375
        assert_relative_eq!(contrastive_loss(&y, &d).unwrap(), 3.375);
    }

    #[test]
    fn test_additivity_over_batch() {
        let d: Tensor<f64> = Tensor::<f64>::rand(vec![2, 3, 3], Some(4)).mul_scalar(1.5);
        let y: Tensor<f64> = Tensor::<f64>::rand(vec![2, 3, 3], Some(5)).apply(|v| if v > 0.5 { 1.0 } else { 0.0 });
        let total = contrastive_loss(&y, &d).unwrap();

        let part = |b: usize| {
            let slice = |t: &Tensor<f64>| Tensor::new(t.data()[b * 9..(b + 1) * 9].to_vec(), vec![1, 3, 3]).unwrap();
            contrastive_loss(&slice(&y), &slice(&d)).unwrap()
        };
        assert_relative_eq!(total, part(0) + part(1), epsilon = 1e-12);
    }

    #[test]
    fn test_custom_margin() {
        let loss = ContrastiveLoss::with_margin(4.0);
        // d = 1: 0.5 * (4 - 1)
        assert_relative_eq!(loss.forward(&map(&[1.0]), &map(&[1.0])).unwrap(), 1.5);
        assert_eq!(ContrastiveLoss::default(), ContrastiveLoss::new());
    }

    #[test]
    fn test_invalid_label() {
        let err = contrastive_loss(&map(&[0.0, 0.5]), &map(&[1.0, 1.0])).unwrap_err();
        assert_eq!(err, TensorError::InvalidLabelValue { index: 1, value: 0.5 });
        assert!(validate_labels(&map(&[1.0, 0.0, 1.0])).is_ok());
        assert!(validate_labels(&map(&[-1.0])).is_err());
    }

    #[test]
    fn test_label_shape_mismatch() {
        let d: Tensor<f64> = Tensor::zeros(vec![1, 2, 2]);
        let y: Tensor<f64> = Tensor::zeros(vec![1, 2, 3]);
        assert_eq!(
            contrastive_loss(&y, &d).unwrap_err(),
            TensorError::ShapeMismatch {
                expected: vec![1, 2, 2],
                got: vec![1, 2, 3],
            }
        );
    }
}
