use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};

/// Dense `f32` tensor stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    values: Vec<f32>,
}

impl Tensor {
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_fn(shape, |_| 0.0)
    }

    /// Creates a tensor by calling `f` for every flat index.
    pub fn from_fn<F>(shape: &[usize], f: F) -> Self
    where
        F: FnMut(usize) -> f32,
    {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            values: (0..len).map(f).collect(),
        }
    }

    /// Creates a tensor from existing values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` does not match the product of `shape`.
    #[must_use]
    pub fn from_values(shape: &[usize], values: Vec<f32>) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            values.len(),
            "shape {shape:?} does not match {} values",
            values.len()
        );
        Self {
            shape: shape.to_vec(),
            values,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element-wise `a·self + b·other`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    #[must_use]
    pub fn linear_combination(&self, a: f32, other: &Tensor, b: f32) -> Tensor {
        assert_eq!(self.shape, other.shape, "tensor shapes differ");
        Tensor {
            shape: self.shape.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(x, y)| a * x + b * y)
                .collect(),
        }
    }
}

/// Counts weight tensors currently held by live networks.
///
/// Every network built by a [`CpuBackend`](crate::network::CpuBackend) takes a
/// [`TensorLease`] from the backend's gauge and returns it when dropped, so a
/// gauge reading that keeps growing across generations means networks are
/// being leaked.
#[derive(Debug, Clone, Default)]
pub struct TensorGauge {
    live: Arc<AtomicUsize>,
}

impl TensorGauge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tensors leased and not yet released.
    #[must_use]
    pub fn live_tensors(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn lease(&self, tensors: usize) -> TensorLease {
        self.live.fetch_add(tensors, Ordering::Relaxed);
        TensorLease {
            live: Arc::clone(&self.live),
            tensors,
        }
    }
}

/// Tensors accounted to a [`TensorGauge`]. Released on drop.
#[derive(Debug)]
pub struct TensorLease {
    live: Arc<AtomicUsize>,
    tensors: usize,
}

impl Drop for TensorLease {
    fn drop(&mut self) {
        self.live.fetch_sub(self.tensors, Ordering::Relaxed);
    }
}
