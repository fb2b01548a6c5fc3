//! churnflow - customer churn feature engineering and evaluation
//!
//! This crate turns a raw CRM export into a churn feature matrix and scores
//! churn classifiers with cross-validated ROC analysis:
//! - Column mapping, rule-based imputation, derived features
//! - Feature matrix construction with one-hot, power, and interaction terms
//! - Seeded stratified k-fold evaluation with mean ROC curves
//! - Optional SMOTE rebalancing of training partitions
//!
//! # Modules
//!
//! ## Data Preparation
//! - [`prep`] - Column mapping, imputation, derived churn features
//! - [`features`] - One-hot encoding and feature matrix construction
//! - [`loader`] - CSV loading and saving
//!
//! ## Modelling
//! - [`model`] - Classifier trait and logistic regression
//! - [`resample`] - Training-set rebalancing (SMOTE)
//! - [`eval`] - Stratified cross-validation and ROC evaluation
//!
//! ## Infrastructure
//! - [`config`] - Column mapping, fill rules, transform options
//! - [`error`] - Error types
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Configuration
pub mod config;

// Data preparation
pub mod features;
pub mod loader;
pub mod prep;

// Modelling
pub mod eval;
pub mod model;
pub mod resample;

// Services
pub mod cli;

// Re-export commonly used types
pub use error::{ChurnError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ColumnMap, PipelineConfig, TransformOptions};
    pub use crate::error::{ChurnError, Result};
    pub use crate::eval::{cross_val_predict, MeanRoc, RocEvaluator, StratifiedKFold};
    pub use crate::features::{FeatureMatrix, FeatureSet, MatrixBuilder, MatrixOptions, OneHotEncoder};
    pub use crate::loader::{DataLoader, DataSaver};
    pub use crate::model::{Classifier, LogisticRegression};
    pub use crate::prep::{
        CleanPipeline, ColumnMapper, FeatureTransformer, FillRule, ImputeRuleSet, Imputer,
    };
    pub use crate::resample::{Resampler, Smote};
}
