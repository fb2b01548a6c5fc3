//! Training-set resampling module
//!
//! Resamplers rebalance a training partition before model fitting. They are
//! applied per evaluation fold and never touch test rows; the fold index is
//! passed in so implementations can derive a deterministic per-fold RNG
//! stream from their own base seed.

mod smote;

pub use smote::Smote;

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Rebalances a labelled training partition
pub trait Resampler: Send + Sync {
    /// Produce a rebalanced copy of `(x, y)` for the given evaluation fold
    fn resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<i64>,
        fold: usize,
    ) -> Result<(Array2<f64>, Array1<i64>)>;
}

/// Count samples per class label
pub fn class_counts(y: &Array1<i64>) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices per class label
pub fn class_indices(y: &Array1<i64>) -> HashMap<i64, Vec<usize>> {
    let mut indices: HashMap<i64, Vec<usize>> = HashMap::new();
    for (idx, &label) in y.iter().enumerate() {
        indices.entry(label).or_default().push(idx);
    }
    indices
}
