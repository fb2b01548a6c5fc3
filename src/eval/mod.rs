//! Model evaluation module
//!
//! Provides stratified cross-validation, ROC curve construction, and the
//! cross-validated mean-ROC evaluator:
//! - Seeded stratified fold assignment
//! - Per-fold ROC curves interpolated onto a shared grid
//! - Pointwise mean curve and trapezoidal AUC
//! - Out-of-fold class predictions

mod cross_validation;
mod evaluator;
pub mod roc;

pub use cross_validation::{FoldSplit, StratifiedKFold};
pub use evaluator::{cross_val_predict, MeanRoc, RocEvaluator};
pub use roc::{auc, fpr_grid, interpolate, roc_curve};
