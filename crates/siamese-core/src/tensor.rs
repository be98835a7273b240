use crate::dtype::Float;
use crate::error::{TensorError, TensorResult};
use crate::shape::Shape;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// N-dimensional tensor, the data structure every stage of the network reads and writes.
///
/// Stores data in a flat contiguous `Vec<T>` with row-major (C-order) layout, so a
/// `(batch, height, width, channels)` tensor keeps each pixel's channel vector contiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> TensorResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, T::ZERO)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: Vec<usize>) -> Self {
        Self::full(shape, T::ONE)
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: Vec<usize>, value: T) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![value; s.numel()],
            shape: s,
        }
    }

    /// Create a 1-D tensor from a slice.
    pub fn from_slice(data: &[T]) -> Self {
        Tensor {
            data: data.to_vec(),
            shape: Shape::new(vec![data.len()]),
        }
    }

    /// Random tensor with uniform distribution in [0, 1).
    ///
    /// With `Some(seed)` the draw is reproducible: the same seed always yields the same values.
    pub fn rand(shape: Vec<usize>, seed: Option<u64>) -> Self {
        let s = Shape::new(shape);
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let data: Vec<T> = (0..s.numel())
            .map(|_| T::from_f64(rng.gen::<f64>()))
            .collect();
        Tensor { data, shape: s }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Get a single element (scalar value).
    pub fn item(&self) -> TensorResult<T> {
        if self.data.len() != 1 {
            return Err(TensorError::InvalidOperation(format!(
                "item() requires exactly 1 element, got {}",
                self.data.len()
            )));
        }
        Ok(self.data[0])
    }

    fn offset(&self, indices: &[usize]) -> TensorResult<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::DimensionMismatch(format!(
                "Expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        let strides = self.shape.strides();
        let mut offset = 0;
        for (i, &idx) in indices.iter().enumerate() {
            let dim_size = self.shape.dim(i)?;
            if idx >= dim_size {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    axis: i,
                    size: dim_size,
                });
            }
            offset += idx * strides[i];
        }
        Ok(offset)
    }

    /// Multi-dimensional indexing.
    pub fn get(&self, indices: &[usize]) -> TensorResult<T> {
        let offset = self.offset(indices)?;
        Ok(self.data[offset])
    }

    /// Set a single element.
    pub fn set(&mut self, indices: &[usize], value: T) -> TensorResult<()> {
        let offset = self.offset(indices)?;
        self.data[offset] = value;
        Ok(())
    }

    /// Reshape (returns a new tensor with same data).
    pub fn reshape(&self, new_shape: Vec<usize>) -> TensorResult<Tensor<T>> {
        let s = Shape::new(new_shape);
        if s.numel() != self.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: self.shape_vec(),
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape: s,
        })
    }

    // ─── Element-wise Operations ────────────────────────────────────────────

    /// Apply a function element-wise.
    pub fn apply<F: Fn(T) -> T>(&self, f: F) -> Tensor<T> {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Apply a function element-wise, in place.
    pub fn apply_mut<F: Fn(T) -> T>(&mut self, f: F) {
        for x in self.data.iter_mut() {
            *x = f(*x);
        }
    }

    pub fn sqrt(&self) -> Tensor<T> { self.apply(T::sqrt) }

    /// `max(0, x)` element-wise. NaN stays NaN.
    pub fn relu(&self) -> Tensor<T> {
        self.apply(|x| if x < T::ZERO { T::ZERO } else { x })
    }

    pub fn add_scalar(&self, s: T) -> Tensor<T> { self.apply(|x| x + s) }
    pub fn mul_scalar(&self, s: T) -> Tensor<T> { self.apply(|x| x * s) }

    // ─── Element-wise Binary Operations ─────────────────────────────────────

    /// Combine two tensors of identical shape element by element.
    ///
    /// No broadcasting: operands whose shapes differ are rejected with `ShapeMismatch`.
    pub fn zip_with<F: Fn(T, T) -> T>(&self, other: &Tensor<T>, op: F) -> TensorResult<Tensor<T>> {
        self.shape.ensure_eq(&other.shape)?;
        let data: Vec<T> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(Tensor {
            data,
            shape: self.shape.clone(),
        })
    }

    pub fn add(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.zip_with(other, |a, b| a * b)
    }

    // ─── Reduction Operations ───────────────────────────────────────────────

    /// Sum of all elements.
    pub fn sum_all(&self) -> T {
        self.data.iter().copied().sum()
    }

    /// Max of all elements.
    pub fn max_all(&self) -> TensorResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::max)
            .ok_or(TensorError::EmptyTensor)
    }

    /// Min of all elements.
    pub fn min_all(&self) -> TensorResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::min)
            .ok_or(TensorError::EmptyTensor)
    }

    /// Fold every lane along `axis` into one value, collapsing that dimension.
    fn reduce_axis<F: Fn(T, T) -> T>(&self, axis: usize, init: T, f: F) -> TensorResult<Tensor<T>> {
        let new_shape = self.shape.without_axis(axis)?;
        let dims = self.shape.dims();

        let outer: usize = dims[..axis].iter().product();
        let axis_size = dims[axis];
        let inner: usize = dims[axis + 1..].iter().product();

        let mut result = vec![init; outer * inner];
        for o in 0..outer {
            for a in 0..axis_size {
                for i in 0..inner {
                    let src = o * axis_size * inner + a * inner + i;
                    let dst = o * inner + i;
                    result[dst] = f(result[dst], self.data[src]);
                }
            }
        }

        Ok(Tensor {
            data: result,
            shape: new_shape,
        })
    }

    /// Sum along a specific axis, collapsing that dimension.
    pub fn sum_axis(&self, axis: usize) -> TensorResult<Tensor<T>> {
        self.reduce_axis(axis, T::ZERO, |acc, x| acc + x)
    }

    /// Euclidean (L2) norm along `axis`: `sqrt(sum(x²))`, collapsing that dimension.
    pub fn norm_axis(&self, axis: usize) -> TensorResult<Tensor<T>> {
        Ok(self.reduce_axis(axis, T::ZERO, |acc, x| acc + x * x)?.sqrt())
    }

    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|x| x.is_nan())
    }
}

impl<T: Float> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

// ─── Display ────────────────────────────────────────────────────────────────

impl<T: Float> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor([")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if i > 6 {
                write!(f, "...")?;
                break;
            }
            write!(f, "{:.4}", v)?;
        }
        write!(f, "], shape={})", self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_creation() {
        let t: Tensor<f32> = Tensor::zeros(vec![1, 2, 2, 3]);
        assert_eq!(t.shape_vec(), vec![1, 2, 2, 3]);
        assert_eq!(t.numel(), 12);
        assert_eq!(t.data()[0], 0.0);

        let t: Tensor<f32> = Tensor::ones(vec![2, 3]);
        assert_eq!(t.sum_all(), 6.0);

        assert!(Tensor::<f32>::new(vec![1.0, 2.0], vec![3]).is_err());
    }

    #[test]
    fn test_get_set_nhwc() {
        let mut t: Tensor<f64> = Tensor::zeros(vec![2, 3, 4, 5]);
        t.set(&[1, 2, 3, 4], 7.0).unwrap();
        assert_eq!(t.get(&[1, 2, 3, 4]).unwrap(), 7.0);
        assert_eq!(t.data()[t.numel() - 1], 7.0);
        assert!(t.get(&[2, 0, 0, 0]).is_err());
        assert!(t.get(&[0, 0, 0]).is_err());
    }

    #[test]
    fn test_zip_requires_same_shape() {
        let a: Tensor<f64> = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let b: Tensor<f64> = Tensor::new(vec![5.0, 6.0, 7.0, 8.0], vec![2, 2]).unwrap();
        assert_eq!(a.add(&b).unwrap().data(), &[6.0, 8.0, 10.0, 12.0]);
        assert_eq!(b.sub(&a).unwrap().data(), &[4.0, 4.0, 4.0, 4.0]);
        assert_eq!(a.mul(&b).unwrap().data(), &[5.0, 12.0, 21.0, 32.0]);

        let c: Tensor<f64> = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        assert!(matches!(
            a.add(&c),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_sum_axis() {
        let a: Tensor<f64> = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let s0 = a.sum_axis(0).unwrap();
        assert_eq!(s0.data(), &[5.0, 7.0, 9.0]);

        let s1 = a.sum_axis(1).unwrap();
        assert_eq!(s1.data(), &[6.0, 15.0]);
        assert!(a.sum_axis(2).is_err());
    }

    #[test]
    fn test_norm_last_axis() {
        // (1, 1, 2, 2): pixel 0 = [3, 4], pixel 1 = [6, 8]
        let a: Tensor<f64> = Tensor::new(vec![3.0, 4.0, 6.0, 8.0], vec![1, 1, 2, 2]).unwrap();
        let n = a.norm_axis(3).unwrap();
        assert_eq!(n.shape_vec(), vec![1, 1, 2]);
        assert_relative_eq!(n.data()[0], 5.0);
        assert_relative_eq!(n.data()[1], 10.0);
    }

    #[test]
    fn test_relu() {
        let a: Tensor<f32> = Tensor::from_slice(&[-1.5, 0.0, 2.5]);
        assert_eq!(a.relu().data(), &[0.0, 0.0, 2.5]);
    }

    #[test]
    fn test_relu_keeps_nan() {
        let a: Tensor<f64> = Tensor::from_slice(&[-1.0, f64::NAN, 1.0]);
        let r = a.relu();
        assert_eq!(r.data()[0], 0.0);
        assert!(r.data()[1].is_nan());
        assert_eq!(r.data()[2], 1.0);
        assert!(r.has_nan());
    }

    #[test]
    fn test_display() {
        let a: Tensor<f64> = Tensor::new(vec![1.0, 2.5], vec![1, 2]).unwrap();
        assert_eq!(a.to_string(), "tensor([1.0000, 2.5000], shape=(1, 2))");
    }

    #[test]
    fn test_rand_is_seeded() {
        let a: Tensor<f64> = Tensor::rand(vec![100], Some(3));
        let b: Tensor<f64> = Tensor::rand(vec![100], Some(3));
        let c: Tensor<f64> = Tensor::rand(vec![100], Some(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.min_all().unwrap() >= 0.0);
        assert!(a.max_all().unwrap() < 1.0);
    }

    #[test]
    fn test_reshape() {
        let a: Tensor<f64> = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let b = a.reshape(vec![1, 1, 2, 3]).unwrap();
        assert_eq!(b.shape_vec(), vec![1, 1, 2, 3]);
        assert_eq!(b.data(), a.data());
        assert!(a.reshape(vec![4]).is_err());
    }
}
