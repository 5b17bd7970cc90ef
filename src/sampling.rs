//! Seeded repeat-count sampling.
//!
//! The only source of randomness in the engine: how many times each job
//! template repeats in an episode. Sampling is isolated behind an
//! explicit seed so episodes are exactly reproducible; nothing in the
//! engine touches ambient global randomness.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Normal-distribution parameters for one template's repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepeatParams {
    /// Mean repeat count.
    pub mean: f64,
    /// Standard deviation of the repeat count.
    pub std_dev: f64,
}

impl RepeatParams {
    /// Creates sampling parameters.
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    /// Fixed repeat count (zero deviation).
    pub fn fixed(count: usize) -> Self {
        Self {
            mean: count as f64,
            std_dev: 0.0,
        }
    }
}

/// Samples one repeat count per template from the given seed.
///
/// Each draw truncates the normal sample toward zero and clamps the
/// result to at least one repeat. Identical `(params, seed)` pairs
/// always produce identical counts.
pub fn sample_repeats(params: &[RepeatParams], seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    params
        .iter()
        .map(|p| {
            let draw = match Normal::new(p.mean, p.std_dev) {
                Ok(normal) => normal.sample(&mut rng),
                // Degenerate deviation: fall back to the mean.
                Err(_) => p.mean,
            };
            (draw as i64).max(1) as usize
        })
        .collect()
}
