//! Feature matrix module
//!
//! Provides one-hot encoding over a fitted vocabulary and the matrix builder
//! that turns a cleaned table into model inputs:
//! - Base feature selection, explicit or all-except-label
//! - Higher-order power terms and pairwise interactions
//! - One-hot expansion with an optional reference level drop
//! - Optional standardization

mod builder;
mod encoder;

pub use builder::{FeatureSet, MatrixBuilder, MatrixOptions};
pub use encoder::OneHotEncoder;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A built feature matrix with its label vector and column names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Row-per-sample feature values
    pub x: Array2<f64>,

    /// Binary labels aligned with the rows of `x`
    pub y: Array1<i64>,

    /// Feature column names aligned with the columns of `x`
    pub names: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}
