//! Stratified fold assignment

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One train/test split of row indices
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter.
///
/// Rows are dealt round-robin within each class, so every fold holds
/// approximately the full-table class proportions. Splits are a pure
/// function of the labels, the fold count, and the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    /// Builder method to disable shuffling within classes
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Assign every row to exactly one test fold
    pub fn split(&self, y: &Array1<i64>) -> Result<Vec<FoldSplit>> {
        if self.n_splits < 2 {
            return Err(ChurnError::ConfigError(
                "cross validation requires at least 2 folds".to_string(),
            ));
        }
        if y.len() < self.n_splits {
            return Err(ChurnError::InsufficientData(format!(
                "{} rows cannot fill {} folds",
                y.len(),
                self.n_splits
            )));
        }

        let mut class_indices: HashMap<i64, Vec<usize>> = HashMap::new();
        for (idx, &label) in y.iter().enumerate() {
            class_indices.entry(label).or_default().push(idx);
        }

        // Iterate classes in sorted label order so a fixed seed always
        // produces the same folds
        let mut classes: Vec<i64> = class_indices.keys().copied().collect();
        classes.sort_unstable();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for class in classes {
            let mut indices = class_indices.remove(&class).unwrap_or_default();
            if self.shuffle {
                indices.shuffle(&mut rng);
            }
            for (i, idx) in indices.into_iter().enumerate() {
                folds[i % self.n_splits].push(idx);
            }
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, fold)| fold.iter().copied())
                    .collect();
                FoldSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();
        Ok(splits)
    }
}
