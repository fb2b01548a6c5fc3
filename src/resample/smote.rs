//! SMOTE oversampling
//!
//! Synthesizes minority-class samples by interpolating between a random
//! class member and one of its k nearest neighbours until every class
//! reaches the majority count. Original rows always come first in the
//! output, with synthetic rows appended.

use crate::error::{ChurnError, Result};
use crate::resample::{class_counts, class_indices, Resampler};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BinaryHeap;
use tracing::debug;

/// Distance and index pair for the nearest-neighbour heap
#[derive(Debug, PartialEq)]
struct DistIdx(f64, usize);

impl Eq for DistIdx {}

impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// SMOTE resampler with a fixed base seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 33,
        }
    }

    /// Builder method to set the neighbourhood size
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors.max(1);
        self
    }

    /// Builder method to set the base seed; the fold index is added to it
    /// at resample time
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler for Smote {
    fn resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<i64>,
        fold: usize,
    ) -> Result<(Array2<f64>, Array1<i64>)> {
        if x.nrows() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(ChurnError::InsufficientClassBalance(
                "resampling requires at least two classes".to_string(),
            ));
        }
        let max_count = counts.values().copied().max().unwrap_or(0);
        let indices = class_indices(y);

        // Sorted class order keeps the RNG stream identical across runs
        let mut classes: Vec<i64> = counts.keys().copied().collect();
        classes.sort_unstable();

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(fold as u64));
        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();

        for class in classes {
            let class_rows = &indices[&class];
            let needed = max_count - class_rows.len();
            if needed == 0 {
                continue;
            }
            if class_rows.len() < 2 {
                return Err(ChurnError::InsufficientData(format!(
                    "class {class} has a single sample, cannot interpolate neighbours"
                )));
            }

            let samples: Vec<Vec<f64>> = class_rows.iter().map(|&i| x.row(i).to_vec()).collect();
            let k = self.k_neighbors.min(samples.len() - 1).max(1);

            for _ in 0..needed {
                let point_idx = rng.gen_range(0..samples.len());
                let neighbors = find_neighbors(point_idx, &samples, k);
                let neighbor_idx = neighbors[rng.gen_range(0..neighbors.len())];
                synthetic_x.push(generate_sample(
                    &samples[point_idx],
                    &samples[neighbor_idx],
                    &mut rng,
                ));
                synthetic_y.push(class);
            }
        }

        let n_original = x.nrows();
        let n_synthetic = synthetic_x.len();
        let n_features = x.ncols();
        debug!(fold, n_original, n_synthetic, "oversampled training partition");

        let out_x = Array2::from_shape_fn((n_original + n_synthetic, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });
        let out_y = Array1::from_shape_fn(n_original + n_synthetic, |i| {
            if i < n_original {
                y[i]
            } else {
                synthetic_y[i - n_original]
            }
        });
        Ok((out_x, out_y))
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Indices of the k nearest neighbours of `target` within `samples`,
/// excluding the target itself
fn find_neighbors(target: usize, samples: &[Vec<f64>], k: usize) -> Vec<usize> {
    let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k);
    for (idx, candidate) in samples.iter().enumerate() {
        if idx == target {
            continue;
        }
        let dist = euclidean(&samples[target], candidate);
        if heap.len() < k {
            heap.push(DistIdx(dist, idx));
        } else if let Some(farthest) = heap.peek() {
            if dist < farthest.0 {
                heap.pop();
                heap.push(DistIdx(dist, idx));
            }
        }
    }
    heap.into_iter().map(|DistIdx(_, idx)| idx).collect()
}

/// Interpolate a synthetic point between a sample and one neighbour
fn generate_sample(point: &[f64], neighbor: &[f64], rng: &mut StdRng) -> Vec<f64> {
    let gap: f64 = rng.gen();
    point
        .iter()
        .zip(neighbor.iter())
        .map(|(p, n)| p + gap * (n - p))
        .collect()
}
