//! Weight-tensor operators for the genetic algorithm.
//!
//! These are the building blocks [`EvolutionEngine`](crate::genetic::EvolutionEngine)
//! applies to every child:
//!
//! - **Crossover**: [`blend_crossover`] mixes two parents tensor by tensor
//! - **Mutation**: [`mutate`] perturbs individual elements
//!
//! # Blend Crossover
//!
//! For each tensor index `i`, two coefficients are drawn from `U(0, 1)` and the
//! child tensor is
//!
//! ```text
//! child[i] = α·a[i] + (1 - β)·b[i]
//! ```
//!
//! With [`CrossoverBlend::Independent`] `α` and `β` are drawn separately, so
//! the two weights do not sum to one and children can shrink or grow relative
//! to their parents. [`CrossoverBlend::Complementary`] reuses `α` as `β`,
//! giving a convex interpolation between the parents.
//!
//! # Mutation
//!
//! Each element is perturbed independently with probability `rate`. The
//! perturbation is uniform in `[-amplitude, amplitude]` by default, or
//! Gaussian `N(0, σ)` with [`Perturbation::Gaussian`].

use std::iter;

use minevo_policy::tensor::Tensor;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// How the two crossover coefficients relate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossoverBlend {
    /// `α` and `β` drawn independently.
    #[default]
    Independent,
    /// `β = α`.
    Complementary,
}

/// Noise added to a weight selected for mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Perturbation {
    /// Uniform in `[-amplitude, amplitude]`.
    Uniform { amplitude: f32 },
    /// Normal with mean 0 and standard deviation `sigma`.
    Gaussian { sigma: f32 },
}

impl Default for Perturbation {
    fn default() -> Self {
        Perturbation::Uniform { amplitude: 0.05 }
    }
}

impl Perturbation {
    /// Returns `true` if the noise scale is finite and non-negative.
    #[must_use]
    pub fn is_valid(self) -> bool {
        let scale = match self {
            Perturbation::Uniform { amplitude } => amplitude,
            Perturbation::Gaussian { sigma } => sigma,
        };
        scale.is_finite() && scale >= 0.0
    }

    fn sample<R>(self, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        match self {
            Perturbation::Uniform { amplitude } => rng.random_range(-amplitude..=amplitude),
            Perturbation::Gaussian { sigma } => sigma * rng.sample::<f32, _>(StandardNormal),
        }
    }
}

/// Blends two parents' weight sequences into a child.
///
/// Fresh coefficients are drawn for every tensor index, so one child can lean
/// towards parent `a` in one layer and towards parent `b` in the next.
///
/// # Arguments
///
/// * `a` - First parent's weights, in layer order
/// * `b` - Second parent's weights, same shapes as `a`
/// * `blend` - Whether `β` is drawn independently or reuses `α`
/// * `rng` - Random number generator
///
/// # Panics
///
/// Panics if the parents have different tensor counts or shapes.
///
/// # Returns
///
/// The child's weights, tensor `i` being `α·a[i] + (1 - β)·b[i]`
pub fn blend_crossover<R>(
    a: &[Tensor],
    b: &[Tensor],
    blend: CrossoverBlend,
    rng: &mut R,
) -> Vec<Tensor>
where
    R: Rng + ?Sized,
{
    assert_eq!(a.len(), b.len(), "parents have different tensor counts");
    iter::zip(a, b)
        .map(|(ta, tb)| {
            let alpha: f32 = rng.random();
            let beta: f32 = match blend {
                CrossoverBlend::Independent => rng.random(),
                CrossoverBlend::Complementary => alpha,
            };
            ta.linear_combination(alpha, tb, 1.0 - beta)
        })
        .collect()
}

/// Perturbs each element with probability `rate`.
///
/// # Arguments
///
/// * `weights` - Weight tensors to mutate (modified in-place)
/// * `rate` - Probability of perturbing each element (default: 0.1)
/// * `perturbation` - Noise added to a selected element
/// * `rng` - Random number generator
///
/// # Panics
///
/// Panics if `rate` is outside `[0, 1]`.
///
/// # Returns
///
/// The number of elements changed
pub fn mutate<R>(weights: &mut [Tensor], rate: f32, perturbation: Perturbation, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    let mut mutated = 0;
    for tensor in weights {
        for w in tensor.values_mut() {
            if rng.random_bool(rate.into()) {
                *w += perturbation.sample(rng);
                mutated += 1;
            }
        }
    }
    mutated
}
