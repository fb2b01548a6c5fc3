//! Logistic regression via gradient descent

use crate::error::{ChurnError, Result};
use crate::model::Classifier;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Binary logistic regression.
///
/// Plain gradient descent on the log loss with optional L2 regularization
/// and optional balanced class weighting, which weights each sample by
/// `n_samples / (2 * count(class))` so the minority class pulls the decision
/// boundary as hard as the majority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    pub fit_intercept: bool,
    /// L2 regularization strength, zero for no penalty
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    /// Weight samples inversely to their class frequency
    pub balanced: bool,
    pub is_fitted: bool,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            alpha: 0.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            balanced: false,
            is_fitted: false,
        }
    }

    /// Builder method to set the L2 regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method to set the maximum number of iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Builder method to set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Builder method to enable balanced class weighting
    pub fn with_balanced_weights(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit coefficients on a feature matrix and binary labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(ChurnError::InsufficientData(
                "cannot fit on an empty matrix".to_string(),
            ));
        }

        let n_pos = y.iter().filter(|&&v| v == 1).count();
        let n_neg = y.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(ChurnError::InsufficientClassBalance(
                "training labels contain a single class".to_string(),
            ));
        }

        let n_samples = x.nrows() as f64;
        let sample_weights: Array1<f64> = if self.balanced {
            let pos_weight = n_samples / (2.0 * n_pos as f64);
            let neg_weight = n_samples / (2.0 * n_neg as f64);
            y.mapv(|v| if v == 1 { pos_weight } else { neg_weight })
        } else {
            Array1::ones(y.len())
        };

        let y_float = y.mapv(|v| v as f64);
        let n_features = x.ncols();
        let mut weights: Array1<f64> = Array1::zeros(n_features);
        let mut bias = 0.0;

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);
            let errors = (&predictions - &y_float) * &sample_weights;

            let dw = (x.t().dot(&errors) / n_samples) + (self.alpha * &weights);
            let db = if self.fit_intercept {
                errors.mean().unwrap_or(0.0)
            } else {
                0.0
            };

            let grad_norm = (dw.dot(&dw) + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * &dw;
            bias -= self.learning_rate * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.is_fitted = true;
        Ok(self)
    }

    /// Positive-class probability for each row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(ChurnError::ModelNotFitted)?;
        let intercept = self.intercept.ok_or(ChurnError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Class prediction at the 0.5 probability threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p >= 0.5 { 1 } else { 0 }))
    }

    /// Accuracy on a labelled matrix
    pub fn score(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", predictions.len()),
                actual: format!("{} labels", y.len()),
            });
        }
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        LogisticRegression::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LogisticRegression::predict_proba(self, x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        LogisticRegression::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<i64>) {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = array![0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_fit_separable() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new()
            .with_learning_rate(0.5)
            .with_max_iter(2000);
        model.fit(&x, &y).unwrap();

        let probs = model.predict_proba(&x).unwrap();
        assert!(probs[0] < 0.2, "negative sample got p = {}", probs[0]);
        assert!(probs[5] > 0.8, "positive sample got p = {}", probs[5]);

        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.to_vec(), vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_balanced_weights_lift_minority() {
        // 8 negatives, 2 positives
        let x = array![
            [-2.0], [-1.8], [-1.6], [-1.4], [-1.2], [-1.0], [-0.8], [-0.6],
            [1.0], [1.2]
        ];
        let y = array![0, 0, 0, 0, 0, 0, 0, 0, 1, 1];

        let mut plain = LogisticRegression::new().with_max_iter(500);
        plain.fit(&x, &y).unwrap();
        let mut balanced = LogisticRegression::new()
            .with_balanced_weights(true)
            .with_max_iter(500);
        balanced.fit(&x, &y).unwrap();

        let query = array![[1.0]];
        let p_plain = plain.predict_proba(&query).unwrap()[0];
        let p_balanced = balanced.predict_proba(&query).unwrap()[0];
        assert!(
            p_balanced > p_plain,
            "balanced {} should exceed plain {}",
            p_balanced,
            p_plain
        );
    }

    #[test]
    fn test_single_class_fails() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1, 1, 1];
        let mut model = LogisticRegression::new();
        let err = model.fit(&x, &y).unwrap_err();
        assert!(matches!(err, ChurnError::InsufficientClassBalance(_)));
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let x = array![[1.0], [2.0]];
        let y = array![0, 1, 0];
        let mut model = LogisticRegression::new();
        let err = model.fit(&x, &y).unwrap_err();
        assert!(matches!(err, ChurnError::ShapeError { .. }));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LogisticRegression::new();
        let err = model.predict_proba(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, ChurnError::ModelNotFitted));
    }

    #[test]
    fn test_feature_count_mismatch_fails() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        let err = model.predict_proba(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ChurnError::ShapeError { .. }));
    }

    #[test]
    fn test_deterministic_fit() {
        let (x, y) = separable();
        let mut a = LogisticRegression::new();
        let mut b = LogisticRegression::new();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.intercept, b.intercept);
    }
}
