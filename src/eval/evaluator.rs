//! Cross-validated ROC evaluation
//!
//! Each fold trains a fresh classifier from a factory closure, optionally
//! rebalancing the training partition first, then scores the held-out rows.
//! Per-fold curves are interpolated onto a shared false-positive-rate grid
//! and averaged pointwise. Fold assignment is materialized up front, so the
//! result is identical whether folds run in parallel or not.

use crate::error::{ChurnError, Result};
use crate::eval::cross_validation::{FoldSplit, StratifiedKFold};
use crate::eval::roc::{auc, fpr_grid, interpolate, roc_curve};
use crate::model::Classifier;
use crate::resample::Resampler;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Mean ROC curve across evaluation folds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanRoc {
    /// Shared false-positive-rate grid
    pub fpr: Vec<f64>,

    /// Pointwise mean true-positive rate over the grid
    pub tpr: Vec<f64>,

    /// Trapezoidal area under the mean curve
    pub auc: f64,

    /// Area under each fold's raw curve, in fold order
    pub fold_aucs: Vec<f64>,
}

/// Cross-validated ROC evaluator
#[derive(Debug, Clone)]
pub struct RocEvaluator {
    folds: usize,
    seed: u64,
    grid_points: usize,
}

impl RocEvaluator {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self {
            folds,
            seed,
            grid_points: 100,
        }
    }

    /// Builder method to set the interpolation grid resolution
    pub fn with_grid_points(mut self, points: usize) -> Self {
        self.grid_points = points.max(2);
        self
    }

    /// Evaluate a classifier factory without resampling
    pub fn evaluate<C, F>(
        &self,
        make_classifier: F,
        x: &Array2<f64>,
        y: &Array1<i64>,
    ) -> Result<MeanRoc>
    where
        C: Classifier,
        F: Fn() -> C + Sync,
    {
        self.run(&make_classifier, None, x, y)
    }

    /// Evaluate with per-fold training-set resampling
    pub fn evaluate_resampled<C, F>(
        &self,
        make_classifier: F,
        resampler: &dyn Resampler,
        x: &Array2<f64>,
        y: &Array1<i64>,
    ) -> Result<MeanRoc>
    where
        C: Classifier,
        F: Fn() -> C + Sync,
    {
        self.run(&make_classifier, Some(resampler), x, y)
    }

    fn run<C, F>(
        &self,
        make_classifier: &F,
        resampler: Option<&dyn Resampler>,
        x: &Array2<f64>,
        y: &Array1<i64>,
    ) -> Result<MeanRoc>
    where
        C: Classifier,
        F: Fn() -> C + Sync,
    {
        if x.nrows() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let splits = StratifiedKFold::new(self.folds, self.seed).split(y)?;
        let grid = fpr_grid(self.grid_points);

        let per_fold: Vec<(Vec<f64>, f64)> = splits
            .par_iter()
            .map(|split| self.run_fold(make_classifier, resampler, x, y, split, &grid))
            .collect::<Result<Vec<_>>>()?;

        let mut mean_tpr = vec![0.0; grid.len()];
        for (curve, _) in &per_fold {
            for (acc, value) in mean_tpr.iter_mut().zip(curve.iter()) {
                *acc += value;
            }
        }
        for acc in &mut mean_tpr {
            *acc /= per_fold.len() as f64;
        }

        let fold_aucs: Vec<f64> = per_fold.iter().map(|(_, a)| *a).collect();
        let mean_auc = auc(&grid, &mean_tpr);
        info!(
            folds = self.folds,
            seed = self.seed,
            mean_auc,
            resampled = resampler.is_some(),
            "cross-validated ROC evaluation complete"
        );

        Ok(MeanRoc {
            fpr: grid,
            tpr: mean_tpr,
            auc: mean_auc,
            fold_aucs,
        })
    }

    fn run_fold<C, F>(
        &self,
        make_classifier: &F,
        resampler: Option<&dyn Resampler>,
        x: &Array2<f64>,
        y: &Array1<i64>,
        split: &FoldSplit,
        grid: &[f64],
    ) -> Result<(Vec<f64>, f64)>
    where
        C: Classifier,
        F: Fn() -> C + Sync,
    {
        let (x_train, y_train) = take_rows(x, y, &split.train_indices);
        check_training_balance(&y_train, split.fold_idx)?;

        let (x_train, y_train) = match resampler {
            Some(resampler) => resampler.resample(&x_train, &y_train, split.fold_idx)?,
            None => (x_train, y_train),
        };

        let mut model = make_classifier();
        model.fit(&x_train, &y_train)?;

        let (x_test, y_test) = take_rows(x, y, &split.test_indices);
        let scores = model.predict_proba(&x_test)?;
        let (fpr, tpr) = roc_curve(&y_test, &scores)?;
        let fold_auc = auc(&fpr, &tpr);

        let mut curve = interpolate(grid, &fpr, &tpr);
        // The mean curve is anchored at the origin regardless of how the
        // first interpolated point lands
        curve[0] = 0.0;

        debug!(fold = split.fold_idx, fold_auc, "fold scored");
        Ok((curve, fold_auc))
    }
}

/// Out-of-fold class predictions for every row.
///
/// Each row is predicted by the one classifier that never saw it during
/// training, using the same stratified assignment as the evaluator.
pub fn cross_val_predict<C, F>(
    make_classifier: F,
    x: &Array2<f64>,
    y: &Array1<i64>,
    folds: usize,
    seed: u64,
) -> Result<Array1<i64>>
where
    C: Classifier,
    F: Fn() -> C + Sync,
{
    if x.nrows() != y.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }

    let splits = StratifiedKFold::new(folds, seed).split(y)?;
    let fold_predictions: Vec<(Vec<usize>, Array1<i64>)> = splits
        .par_iter()
        .map(|split| {
            let (x_train, y_train) = take_rows(x, y, &split.train_indices);
            check_training_balance(&y_train, split.fold_idx)?;

            let mut model = make_classifier();
            model.fit(&x_train, &y_train)?;

            let (x_test, _) = take_rows(x, y, &split.test_indices);
            let predictions = model.predict(&x_test)?;
            Ok((split.test_indices.clone(), predictions))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = vec![0i64; y.len()];
    for (indices, predictions) in fold_predictions {
        for (idx, prediction) in indices.iter().zip(predictions.iter()) {
            out[*idx] = *prediction;
        }
    }
    Ok(Array1::from_vec(out))
}

fn check_training_balance(y_train: &Array1<i64>, fold_idx: usize) -> Result<()> {
    let positives = y_train.iter().filter(|&&v| v == 1).count();
    if positives == 0 || positives == y_train.len() {
        return Err(ChurnError::InsufficientClassBalance(format!(
            "fold {fold_idx} training partition holds a single class"
        )));
    }
    Ok(())
}

fn take_rows(x: &Array2<f64>, y: &Array1<i64>, indices: &[usize]) -> (Array2<f64>, Array1<i64>) {
    let x_rows = x.select(Axis(0), indices);
    let y_rows = Array1::from_iter(indices.iter().map(|&i| y[i]));
    (x_rows, y_rows)
}
