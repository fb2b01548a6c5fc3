//! ROC curve construction and scoring

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use std::cmp::Ordering;

/// Compute ROC curve points from binary labels and positive-class scores.
///
/// Scores are swept from the highest threshold down; tied scores collapse
/// into a single point. Returns `(fpr, tpr)` starting at (0, 0) and ending
/// at (1, 1), with both series nondecreasing.
pub fn roc_curve(labels: &Array1<i64>, scores: &Array1<f64>) -> Result<(Vec<f64>, Vec<f64>)> {
    if labels.len() != scores.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("{} scores", labels.len()),
            actual: format!("{} scores", scores.len()),
        });
    }
    let n = labels.len();
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return Err(ChurnError::InsufficientClassBalance(
            "ROC requires both classes in the scored partition".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut true_pos = 0usize;
    let mut false_pos = 0usize;

    let mut i = 0;
    while i < n {
        let threshold = scores[order[i]];
        while i < n && scores[order[i]] == threshold {
            if labels[order[i]] == 1 {
                true_pos += 1;
            } else {
                false_pos += 1;
            }
            i += 1;
        }
        fpr.push(false_pos as f64 / negatives as f64);
        tpr.push(true_pos as f64 / positives as f64);
    }

    Ok((fpr, tpr))
}

/// Linearly interpolate `(xs, ys)` onto each grid point.
///
/// `xs` must be nondecreasing. Grid points beyond either end clamp to the
/// end values; a grid point that lands on tied `xs` takes the last tied `y`,
/// reading a stepwise curve from above.
pub fn interpolate(grid: &[f64], xs: &[f64], ys: &[f64]) -> Vec<f64> {
    grid.iter().map(|&x| interpolate_one(x, xs, ys)).collect()
}

fn interpolate_one(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }

    // First index with xs[j] >= x; j >= 1 here because x > xs[0]
    let j = xs.partition_point(|&v| v < x);
    if xs[j] == x {
        let mut k = j;
        while k + 1 < n && xs[k + 1] == x {
            k += 1;
        }
        return ys[k];
    }
    let (x0, x1) = (xs[j - 1], xs[j]);
    let (y0, y1) = (ys[j - 1], ys[j]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Trapezoidal area under a curve given by `(x, y)` points
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

/// Evenly spaced false-positive-rate grid over [0, 1]
pub fn fpr_grid(points: usize) -> Vec<f64> {
    let n = points.max(2);
    (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_ranking() {
        let labels = array![0, 0, 1, 1];
        let scores = array![0.1, 0.2, 0.8, 0.9];
        let (fpr, tpr) = roc_curve(&labels, &scores).unwrap();
        assert_eq!(auc(&fpr, &tpr), 1.0);
        assert_eq!(*fpr.first().unwrap(), 0.0);
        assert_eq!(*fpr.last().unwrap(), 1.0);
        assert_eq!(*tpr.last().unwrap(), 1.0);
    }

    #[test]
    fn test_inverted_ranking() {
        let labels = array![1, 1, 0, 0];
        let scores = array![0.1, 0.2, 0.8, 0.9];
        let (fpr, tpr) = roc_curve(&labels, &scores).unwrap();
        assert_eq!(auc(&fpr, &tpr), 0.0);
    }

    #[test]
    fn test_random_ranking_is_half() {
        // All scores tied collapses to the chance diagonal
        let labels = array![0, 1, 0, 1];
        let scores = array![0.5, 0.5, 0.5, 0.5];
        let (fpr, tpr) = roc_curve(&labels, &scores).unwrap();
        assert_eq!(fpr, vec![0.0, 1.0]);
        assert_eq!(tpr, vec![0.0, 1.0]);
        assert_eq!(auc(&fpr, &tpr), 0.5);
    }

    #[test]
    fn test_curves_nondecreasing() {
        let labels = array![0, 1, 1, 0, 1, 0, 0, 1];
        let scores = array![0.3, 0.6, 0.4, 0.5, 0.9, 0.1, 0.7, 0.2];
        let (fpr, tpr) = roc_curve(&labels, &scores).unwrap();
        for w in fpr.windows(2) {
            assert!(w[1] >= w[0]);
        }
        for w in tpr.windows(2) {
            assert!(w[1] >= w[0]);
        }
        let a = auc(&fpr, &tpr);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn test_single_class_fails() {
        let labels = array![1, 1, 1];
        let scores = array![0.1, 0.5, 0.9];
        let err = roc_curve(&labels, &scores).unwrap_err();
        assert!(matches!(err, ChurnError::InsufficientClassBalance(_)));
    }

    #[test]
    fn test_length_mismatch_fails() {
        let labels = array![0, 1];
        let scores = array![0.5];
        let err = roc_curve(&labels, &scores).unwrap_err();
        assert!(matches!(err, ChurnError::ShapeError { .. }));
    }

    #[test]
    fn test_interpolate_midpoints() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let grid = [0.0, 0.25, 0.5, 1.0];
        assert_eq!(interpolate(&grid, &xs, &ys), vec![0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_interpolate_tied_x_takes_upper() {
        // Vertical segment at x = 0.5
        let xs = [0.0, 0.5, 0.5, 1.0];
        let ys = [0.0, 0.2, 0.8, 1.0];
        assert_eq!(interpolate(&[0.5], &xs, &ys), vec![0.8]);
    }

    #[test]
    fn test_interpolate_clamps_ends() {
        let xs = [0.2, 0.8];
        let ys = [0.3, 0.7];
        assert_eq!(interpolate(&[0.0, 1.0], &xs, &ys), vec![0.3, 0.7]);
    }

    #[test]
    fn test_fpr_grid_shape() {
        let grid = fpr_grid(100);
        assert_eq!(grid.len(), 100);
        assert_eq!(grid[0], 0.0);
        assert_eq!(*grid.last().unwrap(), 1.0);
        assert!((grid[1] - 1.0 / 99.0).abs() < 1e-15);
    }

    #[test]
    fn test_trapezoid_area() {
        // Unit square cut by the diagonal
        assert_eq!(auc(&[0.0, 1.0], &[0.0, 1.0]), 0.5);
        // Rectangle of height 1
        assert_eq!(auc(&[0.0, 1.0], &[1.0, 1.0]), 1.0);
    }
}
