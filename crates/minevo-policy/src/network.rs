//! Feed-forward network capability and its CPU implementation.
//!
//! The policy layer only needs four things from a numeric engine: build a
//! fixed-topology network, evaluate it on one input vector, read and replace
//! its ordered weight tensors, and release its resources. [`NetworkBackend`]
//! and [`FeedForward`] describe that capability; [`CpuBackend`] /
//! [`DenseNetwork`] implement it with plain `Vec<f32>` math.
//!
//! # Weight Layout
//!
//! Weights are ordered layer by layer, kernel before bias:
//!
//! ```text
//! [kernel₁ (in × h₁), bias₁ (h₁), kernel₂ (h₁ × h₂), bias₂ (h₂), kernel₃ (h₂ × out), bias₃ (out)]
//! ```
//!
//! Hidden layers use ReLU and the output layer uses softmax.
//!
//! # Resource Release
//!
//! Each [`DenseNetwork`] holds a [`TensorLease`] on its backend's
//! [`TensorGauge`]. Dropping the network releases the lease, so release
//! happens on every path that discards a network.

use std::fmt;

use minevo_engine::BoardConfig;
use rand::RngCore;

use crate::{
    WeightShapeError,
    tensor::{Tensor, TensorGauge, TensorLease},
};

/// Width of each hidden layer.
pub const HIDDEN_UNITS: usize = 128;

/// Layer widths of a policy network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub input: usize,
    pub hidden: [usize; 2],
    pub output: usize,
}

impl Topology {
    /// The fixed policy topology for a board: one input per cell plus the
    /// mine count, two hidden layers, one output per cell.
    #[must_use]
    pub const fn for_board(config: BoardConfig) -> Self {
        let cells = config.cell_count();
        Self {
            input: cells + 1,
            hidden: [HIDDEN_UNITS, HIDDEN_UNITS],
            output: cells,
        }
    }

    fn layer_dims(&self) -> [(usize, usize); 3] {
        [
            (self.input, self.hidden[0]),
            (self.hidden[0], self.hidden[1]),
            (self.hidden[1], self.output),
        ]
    }

    /// Shapes of the ordered weight tensors.
    #[must_use]
    pub fn weight_shapes(&self) -> Vec<Vec<usize>> {
        self.layer_dims()
            .into_iter()
            .flat_map(|(fan_in, fan_out)| [vec![fan_in, fan_out], vec![fan_out]])
            .collect()
    }

    /// Checks that `weights` match this topology tensor by tensor.
    pub fn check_weights(&self, weights: &[Tensor]) -> Result<(), WeightShapeError> {
        let shapes = self.weight_shapes();
        if shapes.len() != weights.len() {
            return Err(WeightShapeError::TensorCount {
                expected: shapes.len(),
                actual: weights.len(),
            });
        }
        for (index, (expected, tensor)) in shapes.into_iter().zip(weights).enumerate() {
            if tensor.shape() != expected.as_slice() {
                return Err(WeightShapeError::TensorShape {
                    index,
                    expected,
                    actual: tensor.shape().to_vec(),
                });
            }
        }
        Ok(())
    }
}

/// A network that can be evaluated and whose weights can be read and replaced.
///
/// Implementations release their numeric resources when dropped.
pub trait FeedForward: fmt::Debug + Send {
    fn topology(&self) -> Topology;

    /// Evaluates the network on a single input vector.
    fn forward(&self, input: &[f32]) -> Vec<f32>;

    /// Returns a copy of all weight tensors in layer order.
    fn weights(&self) -> Vec<Tensor>;

    /// Replaces all weight tensors. Shapes must match [`Self::topology`].
    fn set_weights(&mut self, weights: Vec<Tensor>) -> Result<(), WeightShapeError>;
}

/// Builds networks for a topology.
pub trait NetworkBackend: fmt::Debug {
    /// Builds a network with randomly initialized weights.
    fn init(&self, topology: Topology, rng: &mut dyn RngCore) -> Box<dyn FeedForward>;

    /// Builds a network with the given weights.
    fn with_weights(
        &self,
        topology: Topology,
        weights: Vec<Tensor>,
    ) -> Result<Box<dyn FeedForward>, WeightShapeError>;

    /// Number of weight tensors held by networks from this backend that are
    /// still alive.
    fn live_tensors(&self) -> usize;
}

/// Pure-CPU backend producing [`DenseNetwork`]s.
#[derive(Debug, Clone, Default)]
pub struct CpuBackend {
    gauge: TensorGauge,
}

impl CpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NetworkBackend for CpuBackend {
    fn init(&self, topology: Topology, rng: &mut dyn RngCore) -> Box<dyn FeedForward> {
        let weights = glorot_uniform(topology, rng);
        Box::new(DenseNetwork::new(topology, weights, &self.gauge))
    }

    fn with_weights(
        &self,
        topology: Topology,
        weights: Vec<Tensor>,
    ) -> Result<Box<dyn FeedForward>, WeightShapeError> {
        topology.check_weights(&weights)?;
        Ok(Box::new(DenseNetwork::new(topology, weights, &self.gauge)))
    }

    fn live_tensors(&self) -> usize {
        self.gauge.live_tensors()
    }
}

/// Kernels drawn from `U(-l, l)` with `l = sqrt(6 / (fan_in + fan_out))`,
/// biases zero.
#[expect(clippy::cast_precision_loss)]
fn glorot_uniform(topology: Topology, rng: &mut dyn RngCore) -> Vec<Tensor> {
    use rand::Rng as _;

    let mut weights = Vec::with_capacity(6);
    for (fan_in, fan_out) in topology.layer_dims() {
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        weights.push(Tensor::from_fn(&[fan_in, fan_out], |_| {
            rng.random_range(-limit..limit)
        }));
        weights.push(Tensor::zeros(&[fan_out]));
    }
    weights
}

/// Fully connected ReLU network with a softmax output.
#[derive(Debug)]
pub struct DenseNetwork {
    topology: Topology,
    weights: Vec<Tensor>,
    _lease: TensorLease,
}

impl DenseNetwork {
    fn new(topology: Topology, weights: Vec<Tensor>, gauge: &TensorGauge) -> Self {
        let lease = gauge.lease(weights.len());
        Self {
            topology,
            weights,
            _lease: lease,
        }
    }
}

impl FeedForward for DenseNetwork {
    fn topology(&self) -> Topology {
        self.topology
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        assert_eq!(
            input.len(),
            self.topology.input,
            "input width does not match topology"
        );
        let layers = self.weights.chunks_exact(2);
        let last = layers.len() - 1;
        let mut activations = input.to_vec();
        for (i, layer) in layers.enumerate() {
            let [kernel, bias] = layer else {
                unreachable!("chunks_exact(2) yields pairs");
            };
            activations = dense(&activations, kernel, bias);
            if i < last {
                relu(&mut activations);
            } else {
                softmax(&mut activations);
            }
        }
        activations
    }

    fn weights(&self) -> Vec<Tensor> {
        self.weights.clone()
    }

    fn set_weights(&mut self, weights: Vec<Tensor>) -> Result<(), WeightShapeError> {
        self.topology.check_weights(&weights)?;
        self.weights = weights;
        Ok(())
    }
}

fn dense(input: &[f32], kernel: &Tensor, bias: &Tensor) -> Vec<f32> {
    let fan_out = bias.len();
    let mut output = bias.values().to_vec();
    for (x, row) in input.iter().zip(kernel.values().chunks_exact(fan_out)) {
        if *x == 0.0 {
            continue;
        }
        for (o, w) in output.iter_mut().zip(row) {
            *o += x * w;
        }
    }
    output
}

fn relu(values: &mut [f32]) {
    for v in values {
        *v = v.max(0.0);
    }
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn small_topology() -> Topology {
        Topology {
            input: 3,
            hidden: [4, 4],
            output: 2,
        }
    }

    #[test]
    fn test_board_topology() {
        let topology = Topology::for_board(BoardConfig::new(5, 6, 4).unwrap());
        assert_eq!(topology.input, 31);
        assert_eq!(topology.output, 30);
        assert_eq!(
            topology.weight_shapes(),
            vec![
                vec![31, 128],
                vec![128],
                vec![128, 128],
                vec![128],
                vec![128, 30],
                vec![30],
            ]
        );
    }

    #[test]
    fn test_forward_is_a_distribution() {
        let backend = CpuBackend::new();
        let network = backend.init(small_topology(), &mut Pcg32::seed_from_u64(5));
        let output = network.forward(&[-1.0, 2.0, 9.0]);
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|p| *p >= 0.0));
        assert!((output.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_forward_known_weights() {
        let topology = Topology {
            input: 1,
            hidden: [1, 1],
            output: 2,
        };
        let weights = vec![
            Tensor::from_values(&[1, 1], vec![2.0]),
            Tensor::from_values(&[1], vec![-1.0]),
            Tensor::from_values(&[1, 1], vec![1.0]),
            Tensor::from_values(&[1], vec![0.0]),
            Tensor::from_values(&[1, 2], vec![1.0, 0.0]),
            Tensor::from_values(&[2], vec![0.0, 0.0]),
        ];
        let network = CpuBackend::new().with_weights(topology, weights).unwrap();
        // x = 1 -> relu(2 - 1) = 1 -> 1 -> logits [1, 0]
        let output = network.forward(&[1.0]);
        let e = std::f32::consts::E;
        assert!((output[0] - e / (e + 1.0)).abs() < 1e-6);
        // x = 0 -> relu(-1) = 0 -> logits [0, 0]
        let output = network.forward(&[0.0]);
        assert_eq!(output, vec![0.5, 0.5]);
    }

    #[test]
    fn test_set_weights_checks_shapes() {
        let backend = CpuBackend::new();
        let mut network = backend.init(small_topology(), &mut Pcg32::seed_from_u64(1));
        let mut weights = network.weights();
        weights.pop();
        assert_eq!(
            network.set_weights(weights.clone()),
            Err(WeightShapeError::TensorCount {
                expected: 6,
                actual: 5
            })
        );
        weights.push(Tensor::zeros(&[3]));
        assert_eq!(
            network.set_weights(weights),
            Err(WeightShapeError::TensorShape {
                index: 5,
                expected: vec![2],
                actual: vec![3]
            })
        );
    }

    #[test]
    fn test_dropping_network_releases_tensors() {
        let backend = CpuBackend::new();
        let a = backend.init(small_topology(), &mut Pcg32::seed_from_u64(1));
        let b = backend
            .with_weights(small_topology(), a.weights())
            .unwrap();
        assert_eq!(backend.live_tensors(), 12);
        drop(a);
        assert_eq!(backend.live_tensors(), 6);
        drop(b);
        assert_eq!(backend.live_tensors(), 0);
    }
}
