//! Model module
//!
//! The [`Classifier`] trait is the seam between the evaluation loop and any
//! concrete model: the evaluator only needs fit and probability prediction.

mod logistic;

pub use logistic::LogisticRegression;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A binary classifier producing positive-class probabilities
pub trait Classifier: Send {
    /// Fit on a feature matrix and aligned binary labels
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Positive-class probability for each row of `x`
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Class prediction at the 0.5 probability threshold
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p >= 0.5 { 1 } else { 0 }))
    }
}
